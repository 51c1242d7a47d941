use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    Facebook,
    Instagram,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Facebook, Network::Instagram];

    pub fn id(self) -> &'static str {
        match self {
            Network::Facebook => "fb",
            Network::Instagram => "insta",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Network::Facebook => "Facebook",
            Network::Instagram => "Instagram",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Network::Facebook => "📘",
            Network::Instagram => "📸",
        }
    }

    /// Stylistic hint forwarded to the caption prompt.
    pub fn style_hint(self) -> &'static str {
        match self {
            Network::Facebook => {
                "long-form storytelling, warm and conversational, invites replies in the comments"
            }
            Network::Instagram => {
                "short punchy lines, generous emojis, a strong first line and 5 to 8 hashtags at the end"
            }
        }
    }

    pub fn recommended_tone(self) -> Tone {
        match self {
            Network::Facebook => Tone::Friend,
            Network::Instagram => Tone::Quick,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|network| {
            network.id() == normalized || network.name().to_ascii_lowercase() == normalized
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    Expert,
    Friend,
    Quick,
}

impl Tone {
    pub const ALL: [Tone; 3] = [Tone::Expert, Tone::Friend, Tone::Quick];

    pub fn id(self) -> &'static str {
        match self {
            Tone::Expert => "expert",
            Tone::Friend => "friend",
            Tone::Quick => "quick",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tone::Expert => "L'Experte",
            Tone::Friend => "L'Amie",
            Tone::Quick => "La Flash",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Tone::Expert => "Professionnelle et rassurante",
            Tone::Friend => "Bienveillante et proche",
            Tone::Quick => "Courte, rythmée et percutante",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|tone| tone.id() == normalized)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneOption {
    pub tone: Tone,
    pub recommended: bool,
}

/// Every tone, flagged when it matches the network's hint.
pub fn tone_options(network: Option<Network>) -> Vec<ToneOption> {
    let hinted = network.map(Network::recommended_tone);
    Tone::ALL
        .into_iter()
        .map(|tone| ToneOption {
            tone,
            recommended: hinted == Some(tone),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{tone_options, Network, Tone};

    #[test]
    fn network_parses_id_and_display_name() {
        assert_eq!(Network::parse("insta"), Some(Network::Instagram));
        assert_eq!(Network::parse("Facebook"), Some(Network::Facebook));
        assert_eq!(Network::parse("myspace"), None);
    }

    #[test]
    fn only_the_hinted_tone_is_recommended() {
        let options = tone_options(Some(Network::Instagram));
        let recommended: Vec<Tone> = options
            .iter()
            .filter(|option| option.recommended)
            .map(|option| option.tone)
            .collect();
        assert_eq!(recommended, vec![Tone::Quick]);

        assert!(tone_options(None).iter().all(|option| !option.recommended));
    }
}
