use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Structured JSON text generation.
    Text,
    /// Inline image generation.
    Image,
    /// Text generation grounded by web search.
    Search,
}

impl Capability {
    pub fn id(self) -> &'static str {
        match self {
            Capability::Text => "text",
            Capability::Image => "image",
            Capability::Search => "search",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub provider: String,
    pub capabilities: Vec<Capability>,
    pub context_window: Option<u64>,
}

impl ModelSpec {
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn by_capability(&self, capability: Capability) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(capability))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, name: &str, capability: Capability) -> Option<ModelSpec> {
        let model = self.get(name)?;
        if model.supports(capability) {
            return Some(model.clone());
        }
        None
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str,
                      provider: &str,
                      capabilities: &[Capability],
                      context_window: Option<u64>| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                provider: provider.to_string(),
                capabilities: capabilities.to_vec(),
                context_window,
            },
        );
    };

    insert(
        "gemini-3-pro-preview",
        "gemini",
        &[Capability::Text],
        Some(128000),
    );
    insert(
        "gemini-3-flash-preview",
        "gemini",
        &[Capability::Text, Capability::Search],
        Some(128000),
    );
    insert(
        "gemini-2.5-flash",
        "gemini",
        &[Capability::Text, Capability::Search],
        Some(128000),
    );
    insert("gemini-2.5-flash-image", "gemini", &[Capability::Image], None);
    insert(
        "gemini-3-pro-image-preview",
        "gemini",
        &[Capability::Image],
        None,
    );
    insert(
        "dryrun-text-1",
        "dryrun",
        &[Capability::Text, Capability::Search],
        Some(8192),
    );
    insert("dryrun-image-1", "dryrun", &[Capability::Image], None);

    map
}
