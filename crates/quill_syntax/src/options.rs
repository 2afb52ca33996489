//! Parse options and language feature flags.

bitflags::bitflags! {
    /// Optional language features. A disabled feature still parses, but
    /// reports a diagnostic at its first token.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u32 {
        const NONE              = 0;
        const QUERY_CONCLUSIONS = 1 << 0;
        const DO_STATEMENTS     = 1 << 1;

        const DEFAULT = Self::QUERY_CONCLUSIONS.bits() | Self::DO_STATEMENTS.bits();
    }
}

impl Features {
    /// The user-facing name of a single feature.
    pub fn display_name(self) -> &'static str {
        if self == Features::QUERY_CONCLUSIONS {
            "query conclusions"
        } else if self == Features::DO_STATEMENTS {
            "do statements"
        } else {
            "unknown feature"
        }
    }

    /// Parse a feature name as it appears in compiler options.
    pub fn from_option_name(name: &str) -> Option<Features> {
        match name {
            "queryConclusions" => Some(Features::QUERY_CONCLUSIONS),
            "doStatements" => Some(Features::DO_STATEMENTS),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub features: Features,
}

impl ParseOptions {
    pub fn with_features(features: Features) -> Self {
        Self { features }
    }

    pub fn is_enabled(&self, feature: Features) -> bool {
        self.features.contains(feature)
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            features: Features::DEFAULT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_names_are_camel_case() {
        assert_eq!(Features::from_option_name("queryConclusions"), Some(Features::QUERY_CONCLUSIONS));
        assert_eq!(Features::from_option_name("doStatements"), Some(Features::DO_STATEMENTS));
        assert_eq!(Features::from_option_name("QUERY_CONCLUSIONS"), None);
    }

    #[test]
    fn test_option_name_differs_from_flag_name() {
        assert_eq!(Features::from_name("QUERY_CONCLUSIONS"), Some(Features::QUERY_CONCLUSIONS));
        assert_eq!(Features::from_name("queryConclusions"), None);
    }
}
