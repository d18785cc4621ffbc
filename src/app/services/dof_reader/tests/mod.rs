//! Tests for the DOF source readers

use crate::app::services::format_config::tests::{csv_config, dat_config};
use crate::app::services::format_config::FormatConfiguration;

use super::{DofReader, ReaderOptions};


/// Header of the CSV publication, trimmed to the columns used in tests
pub const CSV_HEADER: &str = "OAS,VERIFIED STATUS,COUNTRY,STATE,CITY,LATDEC,LONDEC,TYPE,QUANTITY,AGL,AMSL,LIGHTING,ACCURACY,MARKING,FAA STUDY,ACTION,JDATE";

/// One valid CSV data line matching [`CSV_HEADER`]
pub const CSV_LINE: &str = "01-000001, O, US, AL, MOBILE , 30.6916667,-88.0433333, TOWER,1,254,280,R,4D,N,2009ASO01234OE,A,2009123";

pub fn csv_content(lines: &[&str]) -> Vec<u8> {
    let mut content = String::from(CSV_HEADER);
    for line in lines {
        content.push('\n');
        content.push_str(line);
    }
    content.push('\n');
    content.into_bytes()
}

pub fn read_csv(content: &[u8]) -> crate::Result<super::ReadResult> {
    let config = csv_config();
    DofReader::new(&config, ReaderOptions::default()).read_bytes(content, "test.csv")
}

pub fn read_dat(content: &[u8]) -> crate::Result<super::ReadResult> {
    let config: FormatConfiguration = dat_config();
    DofReader::new(&config, ReaderOptions::default()).read_bytes(content, "test.dat")
}

/// Four header lines as published ahead of the DAT data
pub fn dat_header() -> String {
    [
        "  CURRENCY DATE = 10/06/24",
        "",
        "OAS            CITY             LATITUDE     LONGITUDE     OBSTACLE",
        "------------------------------------------------------------------",
    ]
    .join("\n")
}
