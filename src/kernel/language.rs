/// Syntax mode handed to the editor for an open file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    JavaScript,
    Json,
    Html,
    Css,
    #[default]
    Text,
}

impl LanguageTag {
    /// Suffix match, so a bare `.js` name still counts as JavaScript.
    pub fn from_path(path: &str) -> Self {
        const SUFFIXES: [(&str, LanguageTag); 4] = [
            (".js", LanguageTag::JavaScript),
            (".json", LanguageTag::Json),
            (".html", LanguageTag::Html),
            (".css", LanguageTag::Css),
        ];

        SUFFIXES
            .iter()
            .find(|(suffix, _)| path.ends_with(*suffix))
            .map(|(_, tag)| *tag)
            .unwrap_or(Self::Text)
    }

    pub fn language_id(self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::Json => "json",
            Self::Html => "html",
            Self::Css => "css",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.language_id())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/language.rs"]
mod tests;
