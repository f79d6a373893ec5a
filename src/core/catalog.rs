//! Static lists the UI offers for filtering.

use super::news::types::NewsCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInfo {
    pub value: NewsCategory,
    pub label: &'static str,
}

/// Categories offered for navigation, in display order.
pub const NEWS_CATEGORIES: [CategoryInfo; 12] = [
    CategoryInfo { value: NewsCategory::Top, label: "Top Stories" },
    CategoryInfo { value: NewsCategory::Business, label: "Business" },
    CategoryInfo { value: NewsCategory::Technology, label: "Technology" },
    CategoryInfo { value: NewsCategory::Entertainment, label: "Entertainment" },
    CategoryInfo { value: NewsCategory::Sports, label: "Sports" },
    CategoryInfo { value: NewsCategory::Science, label: "Science" },
    CategoryInfo { value: NewsCategory::Health, label: "Health" },
    CategoryInfo { value: NewsCategory::Politics, label: "Politics" },
    CategoryInfo { value: NewsCategory::World, label: "World" },
    CategoryInfo { value: NewsCategory::Environment, label: "Environment" },
    CategoryInfo { value: NewsCategory::Food, label: "Food" },
    CategoryInfo { value: NewsCategory::Lifestyle, label: "Lifestyle" },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub code: &'static str,
    pub name: &'static str,
}

pub const COUNTRIES: [Region; 28] = [
    Region { code: "us", name: "United States" },
    Region { code: "ca", name: "Canada" },
    Region { code: "mx", name: "Mexico" },
    Region { code: "gb", name: "United Kingdom" },
    Region { code: "de", name: "Germany" },
    Region { code: "fr", name: "France" },
    Region { code: "es", name: "Spain" },
    Region { code: "it", name: "Italy" },
    Region { code: "nl", name: "Netherlands" },
    Region { code: "se", name: "Sweden" },
    Region { code: "no", name: "Norway" },
    Region { code: "ch", name: "Switzerland" },
    Region { code: "in", name: "India" },
    Region { code: "jp", name: "Japan" },
    Region { code: "cn", name: "China" },
    Region { code: "kr", name: "South Korea" },
    Region { code: "sg", name: "Singapore" },
    Region { code: "ae", name: "UAE" },
    Region { code: "au", name: "Australia" },
    Region { code: "nz", name: "New Zealand" },
    Region { code: "br", name: "Brazil" },
    Region { code: "ar", name: "Argentina" },
    Region { code: "co", name: "Colombia" },
    Region { code: "za", name: "South Africa" },
    Region { code: "ng", name: "Nigeria" },
    Region { code: "eg", name: "Egypt" },
    Region { code: "ke", name: "Kenya" },
    Region { code: "il", name: "Israel" },
];

pub const LANGUAGES: [Region; 10] = [
    Region { code: "en", name: "English" },
    Region { code: "es", name: "Spanish" },
    Region { code: "fr", name: "French" },
    Region { code: "de", name: "German" },
    Region { code: "it", name: "Italian" },
    Region { code: "pt", name: "Portuguese" },
    Region { code: "nl", name: "Dutch" },
    Region { code: "ja", name: "Japanese" },
    Region { code: "zh", name: "Chinese" },
    Region { code: "ar", name: "Arabic" },
];

pub fn category_label(category: NewsCategory) -> Option<&'static str> {
    NEWS_CATEGORIES
        .iter()
        .find(|info| info.value == category)
        .map(|info| info.label)
}

pub fn country_name(code: &str) -> Option<&'static str> {
    lookup(&COUNTRIES, code)
}

pub fn language_name(code: &str) -> Option<&'static str> {
    lookup(&LANGUAGES, code)
}

fn lookup(regions: &[Region], code: &str) -> Option<&'static str> {
    let code = code.trim().to_lowercase();
    regions
        .iter()
        .find(|region| region.code == code)
        .map(|region| region.name)
}
