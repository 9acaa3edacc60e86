//! DAT line parsers: 5-field (5ch/2ch/Shitaraba), 7-field
//! (JBBS, and the structurally identical Machi BBS offlaw variant).

use bbs_core::thread::Res;

const EMPTY_BODY_PLACEHOLDER: &str = "&nbsp;";

/// Accepts both CRLF and LF line endings.
fn lines(body: &str) -> impl Iterator<Item = &str> {
    body.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l))
}

/// `name<>mail<>dateTime<>body<>title`. `title` is populated only on line 1
/// (res #1); `number` is the 1-based line index. Leading spaces of `body`
/// are preserved verbatim (AA alignment) — no trimming.
pub fn parse_5field(body: &str) -> Vec<Res> {
    let mut out = Vec::new();
    for (idx, line) in lines(body).enumerate() {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split("<>").collect();
        if fields.len() < 5 {
            continue;
        }
        let number = (idx + 1) as u32;
        let raw_body = fields[3];
        let body_text = if raw_body.is_empty() {
            EMPTY_BODY_PLACEHOLDER.to_string()
        } else {
            raw_body.to_string()
        };
        out.push(Res {
            number,
            name: fields[0].to_string(),
            mail: fields[1].to_string(),
            date_time: fields[2].to_string(),
            body: body_text,
            title: if number == 1 { fields[4].to_string() } else { String::new() },
            id: None,
        });
    }
    out
}

/// `name<>mail<>dateTime<>body<>title` with field 1 written back unmodified
/// (no re-escaping). Callers should only round-trip lines whose body field
/// was originally non-empty — `parse_5field` normalizes an empty body into
/// the literal placeholder, which is a one-way transform by design.
pub fn serialize_5field(res: &Res) -> String {
    format!(
        "{}<>{}<>{}<>{}<>{}",
        res.name, res.mail, res.date_time, res.body, res.title
    )
}

/// `number<>name<>mail<>dateTime<>body<>title<>id`. Used for both JBBS's
/// native 7-field DAT and Machi BBS's structurally identical offlaw
/// variant. `number` is read from the wire (not the line index) because
/// deleted posts leave gaps.
pub fn parse_7field(body: &str) -> Vec<Res> {
    let mut out = Vec::new();
    for line in lines(body) {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split("<>").collect();
        if fields.len() < 7 {
            continue;
        }
        let Ok(number) = fields[0].parse::<u32>() else {
            continue;
        };
        let raw_body = fields[4];
        let body_text = if raw_body.is_empty() {
            EMPTY_BODY_PLACEHOLDER.to_string()
        } else {
            raw_body.to_string()
        };
        out.push(Res {
            number,
            name: fields[1].to_string(),
            mail: fields[2].to_string(),
            date_time: fields[3].to_string(),
            body: body_text,
            title: if number == 1 { fields[5].to_string() } else { String::new() },
            id: Some(fields[6].to_string()).filter(|s| !s.is_empty()),
        });
    }
    out
}

pub fn serialize_7field(res: &Res) -> String {
    format!(
        "{}<>{}<>{}<>{}<>{}<>{}<>{}",
        res.number,
        res.name,
        res.mail,
        res.date_time,
        res.body,
        res.title,
        res.id.as_deref().unwrap_or("")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_scenario_1_res_1() {
        let line = "名無しさん<>sage<>2024/01/15(月) 12:34:56.78 ID:AbCdEfGh0<>本文テキスト<>スレッドタイトル";
        let res = &parse_5field(line)[0];
        assert_eq!(res.number, 1);
        assert_eq!(res.name, "名無しさん");
        assert_eq!(res.mail, "sage");
        assert_eq!(res.date_time, "2024/01/15(月) 12:34:56.78 ID:AbCdEfGh0");
        assert_eq!(res.body, "本文テキスト");
        assert_eq!(res.title, "スレッドタイトル");
    }

    #[test]
    fn title_only_populated_on_res_1() {
        let body = "a<>b<>c<>body1<>title\nd<>e<>f<>body2<>\n";
        let recs = parse_5field(body);
        assert_eq!(recs[0].title, "title");
        assert_eq!(recs[1].title, "");
        assert_eq!(recs[1].number, 2);
    }

    #[test]
    fn serialize_round_trips_a_valid_line() {
        let line = "名無し<>sage<>時刻<>本文<>タイトル";
        let res = &parse_5field(line)[0];
        assert_eq!(serialize_5field(res), line);
    }

    #[test]
    fn empty_body_becomes_nbsp_placeholder() {
        let line = "a<>b<>c<><>";
        let res = &parse_5field(line)[0];
        assert_eq!(res.body, "&nbsp;");
    }

    #[test]
    fn leading_spaces_in_body_are_preserved() {
        let line = "a<>b<>c<>   indented AA<>";
        let res = &parse_5field(line)[0];
        assert_eq!(res.body, "   indented AA");
    }

    #[test]
    fn accepts_both_crlf_and_lf() {
        let body = "a<>b<>c<>body1<>t\r\nd<>e<>f<>body2<>\r\n";
        let recs = parse_5field(body);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].body, "body1");
        assert_eq!(recs[1].body, "body2");
    }

    #[test]
    fn parses_7field_with_gaps_in_number() {
        let body = "1<>a<>b<>c<>body<>title<>ID1\n5<>d<>e<>f<>body2<>\n";
        let recs = parse_7field(body);
        assert_eq!(recs[0].number, 1);
        assert_eq!(recs[0].id.as_deref(), Some("ID1"));
        assert_eq!(recs[1].number, 5);
        assert_eq!(recs[1].title, "");
    }

    #[test]
    fn serialize_7field_round_trips() {
        let line = "3<>name<>mail<>time<>body<><>idval";
        let res = &parse_7field(line)[0];
        assert_eq!(serialize_7field(res), line);
    }

    // §8: "For any valid 5-field DAT line L, serialize(parse(L)) == L."
    // Fields are restricted to exclude `<`, `>`, and `\n` so the generated
    // line is always a single, unambiguous 5-field record — the invariant is
    // about valid lines, not about recovering information this wire format
    // cannot represent (a literal "<>" inside a field is not parseable at all).
    proptest::proptest! {
        #[test]
        fn serialize_after_parse_is_identity_for_any_valid_5field_line(
            name in "[^<>\n]{0,12}",
            mail in "[^<>\n]{0,12}",
            date_time in "[^<>\n]{0,12}",
            body in "[^<>\n]{1,20}",
            title in "[^<>\n]{0,12}",
        ) {
            let line = format!("{name}<>{mail}<>{date_time}<>{body}<>{title}");
            let parsed = parse_5field(&line);
            prop_assert_eq!(parsed.len(), 1);
            prop_assert_eq!(serialize_5field(&parsed[0]), line);
        }

        #[test]
        fn serialize_after_parse_is_identity_for_any_valid_7field_line(
            number in 1u32..100_000,
            name in "[^<>\n]{0,12}",
            mail in "[^<>\n]{0,12}",
            date_time in "[^<>\n]{0,12}",
            body in "[^<>\n]{1,20}",
            title in "[^<>\n]{0,12}",
            id in "[^<>\n]{1,10}",
        ) {
            let line = format!("{number}<>{name}<>{mail}<>{date_time}<>{body}<>{title}<>{id}");
            let parsed = parse_7field(&line);
            prop_assert_eq!(parsed.len(), 1);
            prop_assert_eq!(serialize_7field(&parsed[0]), line);
        }
    }
}
