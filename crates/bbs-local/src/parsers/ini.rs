//! Hand-rolled INI parser for `Folder.ini`, `SambaTime.ini`,
//! `proxy.ini`, and `dat-replace.ini`. These are small bespoke formats, so
//! this is a direct line-oriented parser rather than a pulled-in config
//! crate.

use indexmap::IndexMap;

/// Preserves section and key order so an unmodified rewrite is byte-stable,
/// and so unknown sections survive a load→mutate→save round trip untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    pub sections: IndexMap<String, IndexMap<String, String>>,
}

impl IniDocument {
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(|s| s.as_str())
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn section(&self, name: &str) -> Option<&IndexMap<String, String>> {
        self.sections.get(name)
    }
}

/// Sections `[Section]`; `key=value`; `;` starts a comment (to end of
/// line, only when it is the first non-whitespace character).
pub fn parse(text: &str) -> IniDocument {
    let mut doc = IniDocument::default();
    let mut current = String::new();
    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            current = name.to_string();
            doc.sections.entry(current.clone()).or_default();
            continue;
        }
        if current.is_empty() {
            continue;
        }
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        doc.sections
            .get_mut(&current)
            .unwrap()
            .insert(k.trim().to_string(), v.trim().to_string());
    }
    doc
}

pub fn serialize(doc: &IniDocument) -> String {
    let mut out = String::new();
    for (section, kv) in &doc.sections {
        out.push_str(&format!("[{section}]\n"));
        for (k, v) in kv {
            out.push_str(&format!("{k}={v}\n"));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_keys() {
        let text = "[ReadProxy]\nProxy=1\nAddress=127.0.0.1\nPort=8080\n; a comment\n[WriteProxy]\nProxy=0\n";
        let doc = parse(text);
        assert_eq!(doc.get("ReadProxy", "Address"), Some("127.0.0.1"));
        assert_eq!(doc.get("ReadProxy", "Port"), Some("8080"));
        assert_eq!(doc.get("WriteProxy", "Proxy"), Some("0"));
    }

    #[test]
    fn preserves_unknown_sections_on_rewrite() {
        let text = "[Known]\nk=v\n[UnknownToUs]\nfoo=bar\n";
        let mut doc = parse(text);
        doc.set("Known", "k", "v2");
        let out = serialize(&doc);
        assert!(out.contains("[UnknownToUs]"));
        assert!(out.contains("foo=bar"));
        assert!(out.contains("k=v2"));
    }

    #[test]
    fn round_trips_samba_time_shape() {
        let text = "[Setting]\nnewsplus=40\n\n[Send]\nnewsplus=2026-07-27T00:00:00Z\n";
        let doc = parse(text);
        assert_eq!(doc.get("Setting", "newsplus"), Some("40"));
        assert_eq!(doc.get("Send", "newsplus"), Some("2026-07-27T00:00:00Z"));
    }
}
