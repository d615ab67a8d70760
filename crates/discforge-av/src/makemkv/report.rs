//! Parser for the extraction tool's line-oriented robot report.
//!
//! Each line is `TAG:field,field,...` where string fields are double-quoted
//! and may contain commas. Only the tags the pipeline needs are kept:
//!
//! - `TINFO:<title>,<code>,<flags>,"<value>"` per-title attributes
//! - `CINFO:<code>,<flags>,"<value>"` disc attributes
//! - `MSG:<code>,<flags>,<count>,"<text>",...` diagnostics
//! - `DRV:<index>,<visible>,<enabled>,<flags>,"<drive>","<disc>","<device>"`
//!
//! Anything else, and any line whose numeric fields do not parse, is skipped.

use std::collections::BTreeMap;

/// `TINFO` code carrying the title duration.
pub const DURATION_CODE: u32 = 9;
/// `TINFO` code carrying the human-readable title size.
pub const SIZE_CODE: u32 = 10;
/// `CINFO` code carrying the disc name.
pub const DISC_NAME_CODE: u32 = 2;

/// Raw per-title fields, keyed by the code that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTitle {
    /// Value reported under [`DURATION_CODE`].
    pub duration: Option<String>,
    /// Value reported under [`SIZE_CODE`].
    pub size: Option<String>,
}

/// A `MSG` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub code: u32,
    pub text: String,
}

/// A `DRV` record for a drive slot that actually holds a drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveEntry {
    pub index: u32,
    pub drive_name: String,
    pub disc_name: String,
    pub device: String,
}

/// Everything parsed out of one report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub disc_name: Option<String>,
    /// Titles keyed by native index, so iteration is in ascending order.
    pub titles: BTreeMap<u32, RawTitle>,
    pub messages: Vec<Message>,
    pub drives: Vec<DriveEntry>,
}

impl Report {
    /// Parse a full report.
    pub fn parse(text: &str) -> Self {
        let mut report = Report::default();

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            let Some((tag, rest)) = line.split_once(':') else {
                continue;
            };

            match tag {
                "TINFO" => report.parse_tinfo(rest),
                "CINFO" => report.parse_cinfo(rest),
                "MSG" => report.parse_msg(rest),
                "DRV" => report.parse_drv(rest),
                _ => {}
            }
        }

        report
    }

    fn parse_tinfo(&mut self, rest: &str) {
        let fields = split_fields(rest);
        if fields.len() < 4 {
            return;
        }
        let (Ok(title), Ok(code)) = (fields[0].parse::<u32>(), fields[1].parse::<u32>()) else {
            return;
        };

        let value = fields[3].clone();
        match code {
            DURATION_CODE => self.titles.entry(title).or_default().duration = Some(value),
            SIZE_CODE => self.titles.entry(title).or_default().size = Some(value),
            _ => {}
        }
    }

    fn parse_cinfo(&mut self, rest: &str) {
        let fields = split_fields(rest);
        if fields.len() < 3 {
            return;
        }
        if fields[0].parse::<u32>() == Ok(DISC_NAME_CODE) && !fields[2].is_empty() {
            self.disc_name = Some(fields[2].clone());
        }
    }

    fn parse_msg(&mut self, rest: &str) {
        let fields = split_fields(rest);
        if fields.len() < 4 {
            return;
        }
        if let Ok(code) = fields[0].parse::<u32>() {
            self.messages.push(Message {
                code,
                text: fields[3].clone(),
            });
        }
    }

    fn parse_drv(&mut self, rest: &str) {
        let fields = split_fields(rest);
        if fields.len() < 7 {
            return;
        }
        let Ok(index) = fields[0].parse::<u32>() else {
            return;
        };
        if fields[4].is_empty() {
            return;
        }
        self.drives.push(DriveEntry {
            index,
            drive_name: fields[4].clone(),
            disc_name: fields[5].clone(),
            device: fields[6].clone(),
        });
    }
}

/// Split a comma-separated field list, honoring double quotes.
///
/// Quotes are removed; commas inside quotes are kept.
fn split_fields(s: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in s.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_fields_with_quoted_commas() {
        assert_eq!(
            split_fields(r#"5021,260,1,"Too old, update","%1","x""#),
            vec!["5021", "260", "1", "Too old, update", "%1", "x"]
        );
        assert_eq!(split_fields(""), vec![""]);
    }

    #[test]
    fn test_parse_titles_and_disc_name() {
        let text = "\
CINFO:1,6209,\"Blu-ray disc\"
CINFO:2,0,\"MY_MOVIE\"
TINFO:0,2,0,\"My Movie\"
TINFO:0,9,0,\"0:04:50\"
TINFO:0,10,0,\"1.2 GB\"
TINFO:1,9,0,\"1:32:10\"
TINFO:1,10,0,\"24.3 GB\"
TINFO:1,27,0,\"MY_MOVIE_t01.mkv\"
";
        let report = Report::parse(text);

        assert_eq!(report.disc_name.as_deref(), Some("MY_MOVIE"));
        assert_eq!(report.titles.len(), 2);
        assert_eq!(
            report.titles[&1],
            RawTitle {
                duration: Some("1:32:10".into()),
                size: Some("24.3 GB".into()),
            }
        );
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let text = "\
TINFO:x,9,0,\"0:10:00\"
TINFO:1,9
garbage line
TINFO:2,9,0,\"0:20:00\"
";
        let report = Report::parse(text);
        assert_eq!(report.titles.keys().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_parse_messages_and_drives() {
        let text = "\
MSG:1005,0,1,\"MakeMKV v1.17.7 linux(x64-release) started\",\"%1 started\",\"MakeMKV v1.17.7 linux(x64-release)\"
DRV:0,2,999,12,\"BD-RE HL-DT-ST BD-RE  WH16NS40\",\"MY_MOVIE\",\"/dev/sr0\"
DRV:1,256,999,0,\"\",\"\",\"\"
";
        let report = Report::parse(text);

        assert_eq!(report.messages.len(), 1);
        assert_eq!(report.messages[0].code, 1005);
        assert!(report.messages[0].text.starts_with("MakeMKV v1.17.7"));

        assert_eq!(report.drives.len(), 1);
        assert_eq!(report.drives[0].device, "/dev/sr0");
        assert_eq!(report.drives[0].disc_name, "MY_MOVIE");
    }

    #[test]
    fn test_parse_crlf_line_endings() {
        let report = Report::parse("TINFO:3,9,0,\"0:30:00\"\r\nTINFO:3,10,0,\"5 GB\"\r\n");
        assert_eq!(report.titles[&3].size.as_deref(), Some("5 GB"));
    }
}
