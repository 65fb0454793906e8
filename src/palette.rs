/// Default series colours, used when the configuration supplies none.
pub const DEFAULT_COLORS: [&str; 8] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#14b8a6", "#f97316",
];

/// Ordered colour list handed out round-robin.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorPalette {
    colors: Vec<String>,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ColorPalette {
    /// User palette if it has at least one colour, otherwise the default.
    pub fn from_config(colors: Option<&[String]>) -> Self {
        match colors {
            Some(colors) if !colors.is_empty() => Self {
                colors: colors.to_vec(),
            },
            _ => Self::default(),
        }
    }

    pub fn color(&self, index: usize) -> &str {
        &self.colors[index % self.colors.len()]
    }

    /// One colour per item, wrapping around the palette.
    pub fn assign(&self, count: usize) -> Vec<String> {
        (0..count).map(|i| self.color(i).to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin() {
        let palette = ColorPalette::default();
        assert_eq!(palette.color(0), "#3b82f6");
        assert_eq!(palette.color(8), "#3b82f6");
        assert_eq!(palette.color(9), "#10b981");
    }

    #[test]
    fn test_empty_user_palette_falls_back() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(ColorPalette::from_config(Some(&empty)), ColorPalette::default());

        let custom = vec!["#000000".to_string(), "#ffffff".to_string()];
        let palette = ColorPalette::from_config(Some(&custom));
        assert_eq!(palette.assign(3), vec!["#000000", "#ffffff", "#000000"]);
    }
}
