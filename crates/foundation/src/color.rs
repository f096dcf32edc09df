/// sRGB color as stored in the section tables (`#rrggbb`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Hex(pub [u8; 3]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color: {0:?}")]
pub struct InvalidHex(pub String);

impl Hex {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Hex([r, g, b])
    }

    pub fn parse(s: &str) -> Result<Self, InvalidHex> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(InvalidHex(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| InvalidHex(s.to_string()))
        };
        Ok(Hex([channel(0)?, channel(2)?, channel(4)?]))
    }

    /// Linear `[0, 1]` RGBA for renderers.
    pub fn to_rgba(self, alpha: f32) -> [f32; 4] {
        let [r, g, b] = self.0;
        [
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            alpha,
        ]
    }
}

impl std::fmt::Display for Hex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl serde::Serialize for Hex {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Hex {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hex::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Fixed categorical palette. Cluster `i` always maps to the same entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette(Vec<Hex>);

impl Palette {
    /// Panics on an empty palette: every section table ships colors.
    pub fn new(colors: Vec<Hex>) -> Self {
        assert!(!colors.is_empty(), "palette must contain at least one color");
        Self(colors)
    }

    pub fn color(&self, cluster: usize) -> Hex {
        self.0[cluster % self.0.len()]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn colors(&self) -> &[Hex] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Hex, Palette};

    #[test]
    fn parses_and_formats() {
        let c = Hex::parse("#1a2B3c").unwrap();
        assert_eq!(c, Hex::rgb(0x1a, 0x2b, 0x3c));
        assert_eq!(c.to_string(), "#1a2b3c");
        assert!(Hex::parse("#12345").is_err());
        assert!(Hex::parse("zzzzzz").is_err());
    }

    #[test]
    fn palette_wraps_around() {
        let p = Palette::new(vec![Hex::rgb(1, 0, 0), Hex::rgb(2, 0, 0)]);
        assert_eq!(p.color(0), p.color(2));
        assert_ne!(p.color(0), p.color(1));
    }

    #[test]
    fn serde_uses_hex_strings() {
        let json = serde_json::to_string(&Hex::rgb(255, 0, 16)).unwrap();
        assert_eq!(json, "\"#ff0010\"");
        let back: Hex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Hex::rgb(255, 0, 16));
    }
}
