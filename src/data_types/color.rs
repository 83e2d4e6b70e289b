use eyre::{eyre, Result};
use gpui::{Hsla, Rgba};

/// Formats a colour as `#rrggbbaa`.
pub fn to_hex(color: Hsla) -> String {
    let rgba = Rgba::from(color);
    format!(
        "#{:02x}{:02x}{:02x}{:02x}",
        channel(rgba.r),
        channel(rgba.g),
        channel(rgba.b),
        channel(rgba.a)
    )
}

/// Parses `#rrggbb` or `#rrggbbaa` (leading `#` optional).
pub fn parse_hex(hex: &str) -> Result<Hsla> {
    let digits = hex.trim().trim_start_matches('#');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(eyre!("invalid colour `{hex}`: non-hex character"));
    }
    let value = u32::from_str_radix(digits, 16)
        .map_err(|e| eyre!("invalid colour `{hex}`: {e}"))?;
    let rgba = match digits.len() {
        6 => (value << 8) | 0xff,
        8 => value,
        _ => return Err(eyre!("invalid colour `{hex}`: expected 6 or 8 hex digits")),
    };
    Ok(Hsla::from(gpui::rgba(rgba)))
}

fn channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

// Serde adapter for Hsla <-> hex string
pub mod hex_color {
    use super::{parse_hex, to_hex};
    use gpui::Hsla;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(color: &Hsla, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&to_hex(*color))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Hsla, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        parse_hex(&hex).map_err(serde::de::Error::custom)
    }

    /// Same encoding for optional fields in settings patches.
    pub mod option {
        use super::{parse_hex, to_hex};
        use gpui::Hsla;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(color: &Option<Hsla>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match color {
                Some(c) => serializer.serialize_some(&to_hex(*c)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Hsla>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|hex| parse_hex(&hex).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
