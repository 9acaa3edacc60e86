//! `bbsmenu.html` parser: extract `<BR><A HREF="...">title</A>`
//! entries grouped by the preceding category heading (`<B>...</B>`).

use crate::util::html_entities::decode_entities;
use html_scraper::Html;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBoardEntry {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCategory {
    pub name: String,
    pub boards: Vec<RawBoardEntry>,
}

fn element_text(el: &html_scraper::ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join("")
}

/// Parses the flat `<B>category</B><BR><A HREF=...>title</A><BR>...` shape.
/// A single combined selector (`b, a`) is used so matches arrive in
/// document order, which is what lets heading/board interleaving work.
///
/// Boards encountered before the first category heading are dropped into an
/// unnamed leading category rather than discarded.
pub fn parse(html: &str) -> Vec<RawCategory> {
    let doc = Html::parse_document(html);
    let Ok(sel) = html_scraper::Selector::parse("b, a") else {
        return Vec::new();
    };

    let mut categories: Vec<RawCategory> = Vec::new();
    let mut current = RawCategory::default();

    for el in doc.select(&sel) {
        match el.value().name() {
            "b" => {
                if !current.name.is_empty() || !current.boards.is_empty() {
                    categories.push(std::mem::take(&mut current));
                }
                current.name = decode_entities(element_text(&el).trim());
            }
            "a" => {
                let Some(href) = el.value().attr("href") else {
                    continue;
                };
                if href.is_empty() {
                    continue;
                }
                current.boards.push(RawBoardEntry {
                    url: href.to_string(),
                    title: decode_entities(element_text(&el).trim()),
                });
            }
            _ => {}
        }
    }
    if !current.name.is_empty() || !current.boards.is_empty() {
        categories.push(current);
    }
    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_boards_under_preceding_category() {
        let html = r#"
            <B>ニュース速報</B><BR>
            <A HREF="https://example.5ch.net/newsplus/">ニュース速報＋</A><BR>
            <B>趣味</B><BR>
            <A HREF="https://example.5ch.net/hobby/">趣味board</A><BR>
        "#;
        let cats = parse(html);
        assert_eq!(cats.len(), 2);
        assert_eq!(cats[0].name, "ニュース速報");
        assert_eq!(cats[0].boards.len(), 1);
        assert_eq!(cats[0].boards[0].url, "https://example.5ch.net/newsplus/");
        assert_eq!(cats[1].name, "趣味");
    }

    #[test]
    fn empty_menu_yields_zero_categories() {
        assert!(parse("").is_empty());
        assert!(parse("<html><body>nothing here</body></html>").is_empty());
    }

    #[test]
    fn decodes_entities_in_titles() {
        let html = r#"<B>cat</B><BR><A HREF="https://x/y/">A &amp; B</A><BR>"#;
        let cats = parse(html);
        assert_eq!(cats[0].boards[0].title, "A & B");
    }
}
