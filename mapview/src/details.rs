//! Text for the selected-tile panel and the influencer card.

use mapdata::{EntityRecord, TileMetadata};
use std::fmt;

/// Detail panel for the selected tile.
pub struct TileDetails<'a>(pub &'a TileMetadata);

impl fmt::Display for TileDetails<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = self.0;
        writeln!(f, "Selected Tile")?;
        writeln!(f, "Position: {}", meta.pos)?;
        writeln!(f, "Elevation: {:.2}", meta.elevation)?;
        writeln!(f, "Terrain: {}", meta.terrain)?;
        write!(f, "Country: {}", meta.country)?;
        if let Some(name) = &meta.influencer {
            write!(f, "\nInfluencer: {}", name)?;
        }
        Ok(())
    }
}

/// Carousel card for one influencer, with display fallbacks for missing fields.
pub struct InfluencerCard<'a>(pub &'a EntityRecord);

fn text_or<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    value.as_deref().filter(|s| !s.is_empty()).unwrap_or(fallback)
}

impl fmt::Display for InfluencerCard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = self.0;
        writeln!(f, "Influencer")?;
        writeln!(f, "Name: {}", text_or(&e.name, "Unknown"))?;
        writeln!(f, "Nation: {}", text_or(&e.nation, "Unknown"))?;
        writeln!(f, "Role: {}", text_or(&e.role, "Unknown"))?;
        writeln!(
            f,
            "Description: {}",
            text_or(&e.description, "No description available")
        )?;
        writeln!(f, "Power: {}", e.power.unwrap_or(0.0))?;
        writeln!(f, "Experience: {}", e.experience.unwrap_or(0.0))?;
        writeln!(f, "Level: {}", e.level.unwrap_or(0.0))?;
        write!(f, "Evolution: {}", e.evolution_steps.join(" → "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapdata::GridPos;

    #[test]
    fn test_tile_details() {
        let meta = TileMetadata {
            pos: GridPos::new(0, 1),
            elevation: 0.4,
            terrain: "land".to_string(),
            country: "Country 2".to_string(),
            influencer: Some("Ada".to_string()),
        };
        let text = TileDetails(&meta).to_string();
        assert_eq!(
            text,
            "Selected Tile\nPosition: 0, 1\nElevation: 0.40\nTerrain: land\nCountry: Country 2\nInfluencer: Ada"
        );
    }

    #[test]
    fn test_tile_details_without_influencer() {
        let meta = TileMetadata {
            pos: GridPos::new(2, 3),
            elevation: 1.0,
            terrain: "water".to_string(),
            country: "Country 1".to_string(),
            influencer: None,
        };
        let text = TileDetails(&meta).to_string();
        assert!(text.ends_with("Country: Country 1"));
        assert!(!text.contains("Influencer"));
    }

    #[test]
    fn test_card_fallbacks() {
        let text = InfluencerCard(&EntityRecord::default()).to_string();
        assert!(text.contains("Name: Unknown"));
        assert!(text.contains("Nation: Unknown"));
        assert!(text.contains("Role: Unknown"));
        assert!(text.contains("Description: No description available"));
        assert!(text.contains("Power: 0\n"));
        assert!(text.contains("Level: 0\n"));
        assert!(text.ends_with("Evolution: "));
    }

    #[test]
    fn test_card_full_record() {
        let record = EntityRecord {
            name: Some("Ada".to_string()),
            nation: Some("3".to_string()),
            role: Some(String::new()),
            power: Some(12.0),
            experience: Some(4.5),
            evolution_steps: vec!["Novice".to_string(), "Adept".to_string()],
            ..Default::default()
        };
        let text = InfluencerCard(&record).to_string();
        assert!(text.contains("Name: Ada"));
        assert!(text.contains("Nation: 3"));
        assert!(text.contains("Role: Unknown"));
        assert!(text.contains("Power: 12\n"));
        assert!(text.contains("Experience: 4.5\n"));
        assert!(text.ends_with("Evolution: Novice → Adept"));
    }
}
