//! Name conversions used when importing templates.

/// Split on runs of separator characters. Leading and trailing separators
/// leave an empty piece at that end.
fn split_runs(s: &str, is_sep: impl Fn(char) -> bool) -> Vec<&str> {
    let pieces: Vec<&str> = s.split(is_sep).collect();
    let last = pieces.len().saturating_sub(1);
    pieces
        .iter()
        .enumerate()
        .filter(|&(i, p)| !p.is_empty() || i == 0 || i == last)
        .map(|(_, p)| *p)
        .collect()
}

/// Upper-case the first character, lower-case the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        }
        None => String::new(),
    }
}

fn is_dash_or_space(c: char) -> bool {
    c == '-' || c.is_whitespace()
}

/// `frozen-peaks_north` → `FrozenPeaksNorth`.
pub fn to_pascal_case(slug: &str) -> String {
    split_runs(slug, |c| c == '_' || is_dash_or_space(c))
        .into_iter()
        .map(capitalize)
        .collect()
}

/// `frozen-peaks` → `Frozen_Peaks`.
pub fn to_biome_id(slug: &str) -> String {
    split_runs(slug, is_dash_or_space)
        .into_iter()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join("_")
}

/// `frozen-peaks` → `Frozen Peaks`.
pub fn to_display_name(slug: &str) -> String {
    split_runs(slug, |c| c == '-' || c == '_')
        .into_iter()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Imported biome file name: `<Pascal>Biome.json`, without doubling a
/// trailing `Biome` (any case).
pub fn biome_file_name(name: &str) -> String {
    let base = match name.len().checked_sub(5) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case("biome") => &name[..cut],
        _ => name,
    };
    format!("{}Biome.json", to_pascal_case(base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case() {
        assert_eq!(to_pascal_case("frozen-peaks_north"), "FrozenPeaksNorth");
        assert_eq!(to_pascal_case("DESERT dunes"), "DesertDunes");
        assert_eq!(to_pascal_case("a--b"), "AB");
    }

    #[test]
    fn biome_ids() {
        assert_eq!(to_biome_id("frozen-peaks"), "Frozen_Peaks");
        assert_eq!(to_biome_id("snow  capped"), "Snow_Capped");
        assert_eq!(to_biome_id("under_score"), "Under_score");
    }

    #[test]
    fn display_names() {
        assert_eq!(to_display_name("frozen-peaks_v2"), "Frozen Peaks V2");
        assert_eq!(to_display_name("single"), "Single");
    }

    #[test]
    fn biome_file_names() {
        assert_eq!(biome_file_name("tundra"), "TundraBiome.json");
        assert_eq!(biome_file_name("TundraBiome"), "TundraBiome.json");
        assert_eq!(biome_file_name("forest_biome"), "ForestBiome.json");
        assert_eq!(biome_file_name("Biome"), "Biome.json");
    }
}
