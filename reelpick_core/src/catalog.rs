use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrizeId {
    Netease,
    Spotify,
    Soda,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Prize {
    pub id: PrizeId,
    pub name: &'static str,
    pub color: &'static str,      // card background, #RRGGBB
    pub text_color: &'static str, // label color on top of `color`
    pub glyph: &'static str,      // short label for text hosts
    pub icon: &'static str,       // SVG path data, 24x24 or 1024x1024 viewBox
    pub icon_view_box: &'static str,
}

const NETEASE_ICON: &str = "M753.4 402.6c-7.9-44.5-39.8-82.6-82.7-100.1-12.7-4.8-25.4-3.2-35 3.2-6.4 7.9-6.4 20.6 1.6 28.6 30.2 25.4 50.8 60.4 54 100.1 4.8 47.7-12.7 92.1-47.7 125.5-38.1 34.9-90.5 46.1-141.4 28.6-50.8-17.5-87.4-58.8-95.3-111.2-1.6-9.5-9.5-15.9-19.1-15.9h-1.6c-9.5 0-17.5 6.4-19.1 15.9 1.6 66.7 49.3 122.3 112.8 141.4 12.7 4.8 25.4 6.4 38.1 6.4 50.8 0 100.1-20.6 135-60.4 42.9-46.1 60.4-111.2 42.9-174.7zM512 262.3c-111.2 0-203.3 81-217.6 187.4-1.6 9.5 4.8 19.1 14.3 20.6 1.6 0 3.2 0 4.8 0 7.9 0 15.9-6.4 17.5-14.3 12.7-87.4 88.9-149.3 179.5-149.3 101.7 0 184.3 82.6 184.3 184.3s-82.6 184.3-184.3 184.3c-73.1 0-135-41.3-165.2-101.7-4.8-7.9-14.3-11.1-23.8-6.4-7.9 4.8-11.1 14.3-6.4 23.8 35 69.9 106.4 116 190.6 116 122.3 0 220.8-98.5 220.8-220.8S634.3 262.3 512 262.3z";
const SPOTIFY_ICON: &str = "M12 2C6.48 2 2 6.48 2 12s4.48 10 10 10 10-4.48 10-10S17.52 2 12 2zm4.65 14.65c-.19.28-.56.37-.84.18-2.31-1.41-5.21-1.73-8.63-.95-.32.07-.65-.13-.72-.45-.07-.32.13-.65.45-.72 3.73-.85 6.94-.48 9.57 1.13.28.18.37.56.18.84zm1.2-2.67c-.23.33-.67.43-1 .2-2.9-1.78-7.31-2.29-10.74-1.25-.4.12-.83-.11-.95-.51-.12-.4.11-.83.51-.95 3.92-1.19 8.83-.62 12.18 1.51.33.23.43.67.2 1zm.1-2.77c-3.47-2.06-9.19-2.25-12.5-1.24-.52.16-1.07-.13-1.23-.65-.16-.52.13-1.07.65-1.23 3.86-1.18 10.21-.96 14.23 1.43.48.28.64.9.36 1.38-.28.48-.9.64-1.38.36z";
const SODA_ICON: &str = "M19 3H10c-1.1 0-2 .9-2 2v10.5c-1.5-.7-3.3-.6-4.6.4-1.6 1.2-1.9 3.5-.7 5.1s3.5 1.9 5.1.7c1.3-1 2-2.6 1.9-4.2V9h7c1.1 0 2-.9 2-2s-.9-2-2-2z";

impl PrizeId {
    pub fn to_prize(self) -> Prize {
        match self {
            PrizeId::Netease => Prize {
                id: self,
                name: "网易云音乐",
                color: "#E60026",
                text_color: "#FFFFFF",
                glyph: "NE",
                icon: NETEASE_ICON,
                icon_view_box: "0 0 1024 1024",
            },
            PrizeId::Spotify => Prize {
                id: self,
                name: "Spotify",
                color: "#1DB954",
                text_color: "#000000",
                glyph: "SP",
                icon: SPOTIFY_ICON,
                icon_view_box: "0 0 24 24",
            },
            PrizeId::Soda => Prize {
                id: self,
                name: "汽水音乐",
                color: "#111111",
                text_color: "#FFFFFF",
                glyph: "SO",
                icon: SODA_ICON,
                icon_view_box: "0 0 24 24",
            },
        }
    }
}

/// Ordered, immutable list of outcomes. A prize's position is its logical index.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Catalog {
    prizes: Vec<Prize>,
}

impl Catalog {
    pub fn new(prizes: Vec<Prize>) -> ConfigResult<Self> {
        if prizes.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        Ok(Self { prizes })
    }

    /// NetEase, Spotify, Soda, in that order.
    pub fn music() -> Self {
        Self {
            prizes: [PrizeId::Netease, PrizeId::Spotify, PrizeId::Soda]
                .into_iter()
                .map(PrizeId::to_prize)
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.prizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prizes.is_empty()
    }

    pub fn prizes(&self) -> &[Prize] {
        &self.prizes
    }

    /// Prize at a logical index; indices outside the catalog wrap around.
    pub fn get(&self, index: usize) -> &Prize {
        &self.prizes[index % self.prizes.len()]
    }

    /// Reduce any integer (negative or past the end) to a logical index.
    pub fn wrap_index(&self, index: i64) -> usize {
        wrap_index(index, self.prizes.len())
    }

    pub fn position(&self, id: PrizeId) -> Option<usize> {
        self.prizes.iter().position(|p| p.id == id)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::music()
    }
}

/// `((index mod len) + len) mod len`, i.e. the Euclidean remainder. `len` must be non-zero.
pub fn wrap_index(index: i64, len: usize) -> usize {
    index.rem_euclid(len as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn music_catalog_order() {
        let catalog = Catalog::music();
        let ids: Vec<PrizeId> = catalog.prizes().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![PrizeId::Netease, PrizeId::Spotify, PrizeId::Soda]);
        assert_eq!(catalog.position(PrizeId::Soda), Some(2));
    }

    #[test]
    fn empty_catalog_rejected() {
        assert_eq!(Catalog::new(vec![]), Err(ConfigError::EmptyCatalog));
    }

    #[test]
    fn wrap_handles_negative_and_large() {
        assert_eq!(wrap_index(-1, 3), 2);
        assert_eq!(wrap_index(-3, 3), 0);
        assert_eq!(wrap_index(7, 3), 1);
        assert_eq!(wrap_index(5, 1), 0);
        assert_eq!(Catalog::music().get(4).id, PrizeId::Spotify);
    }

    #[test]
    fn prize_id_serializes_upper_case() {
        let json = serde_json::to_string(&PrizeId::Netease).unwrap();
        assert_eq!(json, "\"NETEASE\"");
    }
}
