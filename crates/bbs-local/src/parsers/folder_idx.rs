//! `Folder.idx` line format: one TAB-separated line per thread.

use bbs_core::thread::{AgeSage, ThreadIndex};
use bbs_core::{Error, Result};

const FIELD_COUNT: usize = 15;

fn sanitize(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}

/// Readers must unescape `&quot;` before `&amp;` to avoid turning a
/// literal `&amp;quot;` back into `"`.
fn unsanitize(s: &str) -> String {
    s.replace("&quot;", "\"").replace("&amp;", "&")
}

fn age_sage_to_str(v: AgeSage) -> &'static str {
    match v {
        AgeSage::Unset => "0",
        AgeSage::Age => "1",
        AgeSage::Sage => "2",
        AgeSage::SageMismatch => "3",
        AgeSage::Dead => "4",
    }
}

fn age_sage_from_str(s: &str) -> Result<AgeSage> {
    Ok(match s {
        "0" => AgeSage::Unset,
        "1" => AgeSage::Age,
        "2" => AgeSage::Sage,
        "3" => AgeSage::SageMismatch,
        "4" => AgeSage::Dead,
        other => return Err(Error::Parse(format!("invalid ageSage value {other:?}"))),
    })
}

pub fn serialize_row(row: &ThreadIndex) -> String {
    vec![
        row.no.to_string(),
        sanitize(&row.file_name),
        sanitize(&row.title),
        row.count.to_string(),
        row.size.to_string(),
        row.round_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
        row.last_modified.clone().unwrap_or_default(),
        row.kokomade.to_string(),
        row.new_receive.to_string(),
        row.un_read.to_string(),
        row.scroll_top.to_string(),
        row.scroll_res_number.to_string(),
        row.scroll_res_offset.to_string(),
        row.all_res_count.to_string(),
        row.new_res_count.to_string(),
        age_sage_to_str(row.age_sage).to_string(),
    ]
    .join("\t")
}

pub fn parse_row(line: &str) -> Result<ThreadIndex> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != FIELD_COUNT + 1 {
        return Err(Error::Parse(format!(
            "Folder.idx row has {} fields, expected {}",
            fields.len(),
            FIELD_COUNT + 1
        )));
    }
    let parse_u32 = |s: &str, name: &str| s.parse::<u32>().map_err(|_| Error::Parse(format!("{name}: {s:?}")));
    let parse_i32 = |s: &str, name: &str| s.parse::<i32>().map_err(|_| Error::Parse(format!("{name}: {s:?}")));
    let parse_u64 = |s: &str, name: &str| s.parse::<u64>().map_err(|_| Error::Parse(format!("{name}: {s:?}")));
    let parse_bool = |s: &str, name: &str| s.parse::<bool>().map_err(|_| Error::Parse(format!("{name}: {s:?}")));

    Ok(ThreadIndex {
        no: parse_u32(fields[0], "no")?,
        file_name: unsanitize(fields[1]),
        title: unsanitize(fields[2]),
        count: parse_u32(fields[3], "count")?,
        size: parse_u64(fields[4], "size")?,
        round_date: if fields[5].is_empty() {
            None
        } else {
            Some(
                chrono::DateTime::parse_from_rfc3339(fields[5])
                    .map_err(|e| Error::Parse(format!("roundDate: {e}")))?
                    .with_timezone(&chrono::Utc),
            )
        },
        last_modified: if fields[6].is_empty() { None } else { Some(fields[6].to_string()) },
        kokomade: parse_i32(fields[7], "kokomade")?,
        new_receive: parse_bool(fields[8], "newReceive")?,
        un_read: parse_bool(fields[9], "unRead")?,
        scroll_top: parse_i32(fields[10], "scrollTop")?,
        scroll_res_number: parse_i32(fields[11], "scrollResNumber")?,
        scroll_res_offset: parse_i32(fields[12], "scrollResOffset")?,
        all_res_count: parse_u32(fields[13], "allResCount")?,
        new_res_count: parse_u32(fields[14], "newResCount")?,
        age_sage: age_sage_from_str(fields[15])?,
    })
}

pub fn serialize(rows: &[ThreadIndex]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&serialize_row(row));
        out.push('\n');
    }
    out
}

pub fn parse(text: &str) -> Result<Vec<ThreadIndex>> {
    text.lines().filter(|l| !l.is_empty()).map(parse_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ThreadIndex {
        ThreadIndex {
            no: 1,
            file_name: "1234567890.dat".to_string(),
            title: "A & B \"quoted\"".to_string(),
            count: 10,
            size: 2048,
            round_date: Some(chrono::Utc::now()),
            last_modified: Some("Wed, 21 Oct 2015 07:28:00 GMT".to_string()),
            kokomade: 5,
            new_receive: true,
            un_read: false,
            scroll_top: 0,
            scroll_res_number: 3,
            scroll_res_offset: 0,
            all_res_count: 10,
            new_res_count: 2,
            age_sage: AgeSage::Sage,
        }
    }

    #[test]
    fn round_trips_a_row() {
        let row = sample();
        let line = serialize_row(&row);
        let parsed = parse_row(&line).unwrap();
        assert_eq!(parsed, row);
    }

    #[test]
    fn sanitizes_ampersand_and_quote_in_title() {
        let row = sample();
        let line = serialize_row(&row);
        assert!(line.contains("A &amp; B &quot;quoted&quot;"));
    }

    #[test]
    fn unsanitize_order_avoids_double_unescaping() {
        // &amp;quot; must become &quot; (literal), not `"`.
        assert_eq!(unsanitize("&amp;quot;"), "&quot;");
    }

    #[test]
    fn kokomade_never_exceeds_all_res_count_after_round_trip() {
        let row = sample();
        let parsed = parse_row(&serialize_row(&row)).unwrap();
        assert!(parsed.check_invariants());
    }
}
