use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagingAngle {
    Scientific,
    Wellness,
    Promotional,
}

impl MessagingAngle {
    pub const ALL: [MessagingAngle; 3] = [
        MessagingAngle::Scientific,
        MessagingAngle::Wellness,
        MessagingAngle::Promotional,
    ];

    pub fn id(self) -> &'static str {
        match self {
            MessagingAngle::Scientific => "scientific",
            MessagingAngle::Wellness => "wellness",
            MessagingAngle::Promotional => "promotional",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MessagingAngle::Scientific => "Scientifique",
            MessagingAngle::Wellness => "Bien-être",
            MessagingAngle::Promotional => "Promotion",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|angle| angle.id() == normalized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Joints,
    Energy,
    Beauty,
    Digestion,
    Detox,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 5] = [
        ProductCategory::Joints,
        ProductCategory::Energy,
        ProductCategory::Beauty,
        ProductCategory::Digestion,
        ProductCategory::Detox,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ProductCategory::Joints => "joints",
            ProductCategory::Energy => "energy",
            ProductCategory::Beauty => "beauty",
            ProductCategory::Digestion => "digestion",
            ProductCategory::Detox => "detox",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProductCategory::Joints => "Articulations",
            ProductCategory::Energy => "Énergie",
            ProductCategory::Beauty => "Beauté",
            ProductCategory::Digestion => "Digestion",
            ProductCategory::Detox => "Détox",
        }
    }

    /// `all` (or an empty filter) parses to `Ok(None)`, meaning no category filter.
    pub fn parse_filter(raw: &str) -> Result<Option<Self>, String> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() || normalized == "all" {
            return Ok(None);
        }
        Self::ALL
            .into_iter()
            .find(|category| category.id() == normalized)
            .map(Some)
            .ok_or_else(|| format!("Unknown product category '{normalized}'."))
    }
}

/// Copy for each messaging angle. Every product must carry all three.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AngleCopy {
    pub scientific: String,
    pub wellness: String,
    pub promotional: String,
}

impl AngleCopy {
    pub fn text(&self, angle: MessagingAngle) -> &str {
        match angle {
            MessagingAngle::Scientific => &self.scientific,
            MessagingAngle::Wellness => &self.wellness,
            MessagingAngle::Promotional => &self.promotional,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: ProductCategory,
    pub icon: String,
    pub price_cents: u32,
    pub description: String,
    pub angles: AngleCopy,
    /// URL or path (relative to the assets directory) of the transparent cut-out.
    pub overlay: String,
}

impl Product {
    pub fn angle_text(&self, angle: MessagingAngle) -> &str {
        self.angles.text(angle)
    }

    pub fn formatted_price(&self) -> String {
        format!("{},{:02} €", self.price_cents / 100, self.price_cents % 100)
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    products: IndexMap<String, Product>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Catalog {
    pub fn new(products: Option<IndexMap<String, Product>>) -> Self {
        Self {
            products: products.unwrap_or_else(default_products),
        }
    }

    pub fn from_products(products: Vec<Product>) -> Self {
        Self::new(Some(
            products
                .into_iter()
                .map(|product| (product.id.clone(), product))
                .collect(),
        ))
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.get(id.trim())
    }

    pub fn list(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn search(&self, query: &str, category: Option<ProductCategory>) -> Vec<&Product> {
        let needle = query.trim().to_lowercase();
        self.products
            .values()
            .filter(|product| category.map_or(true, |wanted| product.category == wanted))
            .filter(|product| needle.is_empty() || product.name.to_lowercase().contains(&needle))
            .collect()
    }
}

fn default_products() -> IndexMap<String, Product> {
    let mut map = IndexMap::new();

    let mut insert = |id: &str,
                      name: &str,
                      category: ProductCategory,
                      icon: &str,
                      price_cents: u32,
                      description: &str,
                      angles: [&str; 3],
                      overlay: &str| {
        map.insert(
            id.to_string(),
            Product {
                id: id.to_string(),
                name: name.to_string(),
                category,
                icon: icon.to_string(),
                price_cents,
                description: description.to_string(),
                angles: AngleCopy {
                    scientific: angles[0].to_string(),
                    wellness: angles[1].to_string(),
                    promotional: angles[2].to_string(),
                },
                overlay: overlay.to_string(),
            },
        );
    };

    insert(
        "detox",
        "Elixir Détox",
        ProductCategory::Detox,
        "🌿",
        3490,
        "Cure drainante aux plantes pour accompagner l'élimination naturelle.",
        [
            "Formule à base de radis noir et d'artichaut, deux plantes étudiées pour soutenir la fonction hépatique.",
            "Un rituel du matin pour se sentir plus légère et retrouver une sensation de pureté.",
            "Offre de saison : la cure de 20 jours à prix doux pour démarrer le printemps.",
        ],
        "products/elixir-detox.png",
    );
    insert(
        "col",
        "Collagène Natif Type II",
        ProductCategory::Joints,
        "🦴",
        3990,
        "Soutien structurel du cartilage.",
        [
            "Collagène non dénaturé de type II, la forme présente naturellement dans le cartilage.",
            "Retrouver le plaisir de bouger et de marcher sans y penser.",
            "Le mois de la mobilité : votre deuxième boîte à moitié prix.",
        ],
        "https://images.unsplash.com/photo-1626776876729-babd0f2a583a?q=80&w=300&auto=format&fit=crop",
    );
    insert(
        "vit",
        "Vitamine C Liposomale",
        ProductCategory::Energy,
        "🍊",
        2490,
        "Énergie vitale et immunité.",
        [
            "L'encapsulation liposomale protège la vitamine C et améliore son absorption.",
            "Un coup d'éclat quotidien pour traverser l'hiver avec entrain.",
            "Pack immunité : trois flacons pour le prix de deux.",
        ],
        "https://images.unsplash.com/photo-1584308666744-24d5c474f2ae?q=80&w=300&auto=format&fit=crop",
    );
    insert(
        "ome",
        "Omega 3 Krill Premium",
        ProductCategory::Energy,
        "🐟",
        3290,
        "Protection cardio et mémoire.",
        [
            "Les phospholipides du krill transportent EPA et DHA sous une forme facilement assimilable.",
            "Prendre soin de son cœur et de sa mémoire, simplement.",
            "Livraison offerte sur la cure de trois mois.",
        ],
        "https://images.unsplash.com/photo-1550573105-4584e7d7a631?q=80&w=300&auto=format&fit=crop",
    );
    insert(
        "cur",
        "Curcuma Gold+",
        ProductCategory::Joints,
        "🟡",
        2790,
        "Anti-inflammatoire naturel.",
        [
            "Curcumine associée à la pipérine du poivre noir pour une biodisponibilité renforcée.",
            "La douceur dorée d'une tradition ancestrale dans votre routine.",
            "Édition limitée : le coffret Gold+ avec son infuseur offert.",
        ],
        "https://images.unsplash.com/photo-1615485290382-441e4d049cb5?q=80&w=300&auto=format&fit=crop",
    );
    insert(
        "mag",
        "Magnésium Marin B6",
        ProductCategory::Energy,
        "🌊",
        1990,
        "Détente musculaire.",
        [
            "Le magnésium marin et la vitamine B6 contribuent à réduire la fatigue.",
            "Des soirées plus sereines et des nuits plus douces.",
            "Prix ambassadrice : -15 % avec le code de Katy.",
        ],
        "https://images.unsplash.com/photo-1584017911766-d451b3d0e843?q=80&w=300&auto=format&fit=crop",
    );
    insert(
        "hyl",
        "Acide Hyaluronique",
        ProductCategory::Beauty,
        "💧",
        3590,
        "Hydratation de la peau.",
        [
            "L'acide hyaluronique retient jusqu'à mille fois son poids en eau.",
            "Une peau confortable et lumineuse, jour après jour.",
            "Rituel beauté : le sérum assorti offert pour toute cure.",
        ],
        "https://images.unsplash.com/photo-1570172619380-41017011d0a1?q=80&w=300&auto=format&fit=crop",
    );

    map
}

#[cfg(test)]
mod tests {
    use super::{Catalog, MessagingAngle, ProductCategory};

    #[test]
    fn default_catalog_carries_every_angle_for_every_product() {
        let catalog = Catalog::default();
        assert!(catalog.get("detox").is_some());
        for product in catalog.list() {
            for angle in MessagingAngle::ALL {
                assert!(
                    !product.angle_text(angle).trim().is_empty(),
                    "{} missing {} copy",
                    product.id,
                    angle.id()
                );
            }
        }
    }

    #[test]
    fn search_filters_by_name_and_category() {
        let catalog = Catalog::default();
        let energy = catalog.search("", Some(ProductCategory::Energy));
        assert_eq!(
            energy.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            vec!["vit", "ome", "mag"]
        );

        let named = catalog.search("  ELIXIR ", None);
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].name, "Elixir Détox");

        assert!(catalog
            .search("elixir", Some(ProductCategory::Beauty))
            .is_empty());
    }

    #[test]
    fn category_filter_parses_all_as_unfiltered() {
        assert_eq!(ProductCategory::parse_filter("all"), Ok(None));
        assert_eq!(ProductCategory::parse_filter(""), Ok(None));
        assert_eq!(
            ProductCategory::parse_filter("Beauty"),
            Ok(Some(ProductCategory::Beauty))
        );
        assert!(ProductCategory::parse_filter("toys").is_err());
    }

    #[test]
    fn price_formats_in_euros() {
        let catalog = Catalog::default();
        let product = catalog.get("detox").map(|p| p.formatted_price());
        assert_eq!(product.as_deref(), Some("34,90 €"));
    }

    #[test]
    fn angle_parse_is_case_insensitive() {
        assert_eq!(
            MessagingAngle::parse(" Promotional "),
            Some(MessagingAngle::Promotional)
        );
        assert_eq!(MessagingAngle::parse("funny"), None);
    }
}
