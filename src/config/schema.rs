// SPDX-License-Identifier: GPL-3.0-only
use crate::engine::FieldVisibility;

/// Columns of the CAMA assessment table, in table order
const CAMA_FIELDS: &[&str] = &[
    "OBJECTID",
    "PIDN",
    "DISTRICT",
    "BLOCK",
    "MAP",
    "PARCEL",
    "PARCEL_MAJOR",
    "PARCEL_MINOR",
    "LEASEHD",
    "PIDN_LEASE",
    "CARD_NO",
    "MASTER",
    "DEED_BK",
    "DEED_PG",
    "SITE_ST_NO",
    "SITE_ST_DIR",
    "SITE_ST_NAME",
    "SITE_ST_SUF",
    "PROPADR",
    "OWNER_FULL",
    "OWN_NAME1",
    "OWN_NAME2",
    "MAIL_ADDR_FULL",
    "MAIL_ADDR1",
    "MAIL_ADDR2",
    "MAIL_ADDR3",
    "PREV_OWNER",
    "CLASS",
    "LUC",
    "ACRES",
    "STYLE",
    "NUM_STORIE",
    "RES_LIVING_AREA",
    "YRBLT",
    "CLEAN_GREEN",
    "HEATSYS",
    "FUEL",
    "UTILITY",
    "APRLAND",
    "APRBLDG",
    "APRTOTAL",
    "SALEDT",
    "PRICE",
    "PREV_PRICE",
    "SCHOOL_DIS",
    "COMM_STRUC",
    "COMM_YEAR_BUILT",
    "COMM_BUILDING_SQ_FT",
    "GRADE",
    "CDU",
    "GlobalID",
    "HYPERLINK",
];

/// Table-view schema used when no `[[cama.fields]]` are configured: every column visible
pub fn default_cama_fields() -> Vec<FieldVisibility> {
    CAMA_FIELDS.iter().map(|name| FieldVisibility::visible(name)).collect()
}
