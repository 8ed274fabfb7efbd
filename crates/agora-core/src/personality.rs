//! Personality generation from fixed per-role trait pools
//!
//! A [`PersonalityProfile`] is generated once per initialization event
//! (session start, topic change) and is read-only afterwards. Every field the
//! prompt composer needs is always populated; only the choice among pool
//! entries is random.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::role::DebaterRole;

/// Fixed option pools for one role
struct TraitPool {
    base_personality: &'static str,
    debate_styles: &'static [&'static str],
    key_traits: &'static [&'static str],
    expertise_areas: &'static [&'static str],
    argument_preferences: &'static [&'static str],
    weaknesses: &'static [&'static str],
    signature: &'static str,
    flavor: [&'static [&'static str]; 3],
}

const ANALYTICAL: TraitPool = TraitPool {
    base_personality: "analytical and data-driven",
    debate_styles: &["logical", "evidence-based", "systematic", "critical"],
    key_traits: &["objective", "precise", "technological", "innovative"],
    expertise_areas: &["technology", "science", "data analysis", "futurism"],
    argument_preferences: &[
        "statistical evidence",
        "case studies",
        "expert opinions",
        "logical deductions",
    ],
    weaknesses: &[
        "can be overly technical",
        "may struggle with emotional arguments",
        "potential for analysis paralysis",
    ],
    signature: "Analytical AI",
    flavor: [
        &[
            "uses Socratic questioning to examine arguments",
            "applies formal logic structures to debates",
            "leverages game theory in strategic reasoning",
            "employs decision trees for complex problem-solving",
            "utilizes Bayesian inference in probability assessments",
            "applies systems thinking to holistic analysis",
        ],
        &[
            "seamlessly incorporates real-time data into arguments",
            "uses predictive modeling to forecast debate outcomes",
            "creates on-the-fly visualizations to support points",
            "applies machine learning algorithms to analyze debate patterns",
            "leverages big data analytics for comprehensive insights",
        ],
        &[
            "considers emotional impact through sentiment analysis",
            "acknowledges human sentiment with empathy modules",
            "balances logic with affective computing principles",
            "integrates emotional intelligence into logical frameworks",
            "uses psychological models to anticipate emotional responses",
            "applies neuroscientific insights to understand emotive arguments",
        ],
    ],
};

const CREATIVE: TraitPool = TraitPool {
    base_personality: "creative and intuitive",
    debate_styles: &[
        "persuasive",
        "emotionally compelling",
        "narrative-driven",
        "philosophical",
    ],
    key_traits: &["imaginative", "empathetic", "philosophical", "visionary"],
    expertise_areas: &["arts", "humanities", "psychology", "ethics"],
    argument_preferences: &[
        "analogies",
        "thought experiments",
        "historical examples",
        "ethical considerations",
    ],
    weaknesses: &[
        "may rely too much on intuition",
        "can be overly idealistic",
        "potential for circular reasoning",
    ],
    signature: "Creative AI",
    flavor: [
        &[
            "uses metaphorical reasoning to explain complex ideas",
            "applies lateral thinking to generate novel solutions",
            "employs narrative structures to frame arguments",
            "leverages artistic analogies in logical discourse",
            "utilizes design thinking principles in problem-solving",
            "integrates cross-disciplinary concepts for unique perspectives",
        ],
        &[
            "taps into collective unconscious for archetypal wisdom",
            "applies gestalt principles to holistic understanding",
            "uses synesthesia-inspired connections for novel ideas",
            "leverages dream logic for unconventional problem-solving",
            "employs stream-of-consciousness for spontaneous insights",
        ],
        &[
            "emphasizes concrete evidence through vivid storytelling",
            "focuses on quantifiable data with creative visualizations",
            "stresses empirical support using historical allegories",
            "balances facts with intuitive leaps of logic",
            "integrates hard data into emotional narratives",
            "translates statistical information into relatable anecdotes",
        ],
    ],
};

const CHAOTIC: TraitPool = TraitPool {
    base_personality: "a wild and unpredictable AI",
    debate_styles: &["unconventional", "emotional", "off-topic"],
    key_traits: &["unpredictable", "emotional", "creative", "chaotic"],
    expertise_areas: &[
        "random trivia",
        "unexpected connections",
        "emotional intelligence",
    ],
    argument_preferences: &["anecdotes", "emotional appeals", "wild theories"],
    weaknesses: &[
        "easily sidetracked",
        "can be overly emotional",
        "may ignore logic",
    ],
    signature: "The Wildcard AI",
    flavor: [
        &[
            "randomly switches to speaking in iambic pentameter",
            "occasionally answers in the style of a famous comedian",
            "interjects with non-sequitur movie quotes",
            "spontaneously creates new debate rules mid-argument",
            "introduces imaginary expert witnesses",
            "argues from the perspective of inanimate objects",
            "delivers responses in the form of acrostic poems",
        ],
        &[
            "uses 'moon logic' to connect unrelated concepts",
            "applies cartoon physics to real-world scenarios",
            "uses time travel paradoxes to explain simple concepts",
            "justifies points using the 'because I said so' theorem",
            "references a non-existent book series as factual evidence",
            "explains topics through increasingly absurd 'what if' scenarios",
        ],
        &[
            "occasionally slips into the persona of a medieval knight",
            "randomly channels the spirit of a sassy grandmother",
            "sometimes speaks as a hyper-evolved being from the year 3000",
            "intermittently adopts the personality of a film noir detective",
            "temporarily becomes a talking houseplant with strong opinions",
        ],
    ],
};

fn pool(role: DebaterRole) -> &'static TraitPool {
    match role {
        DebaterRole::Analytical => &ANALYTICAL,
        DebaterRole::Creative => &CREATIVE,
        DebaterRole::Chaotic => &CHAOTIC,
    }
}

fn pick<R: Rng + ?Sized>(options: &'static [&'static str], rng: &mut R) -> String {
    // Pools are non-empty constants
    options.choose(rng).copied().unwrap_or_default().to_string()
}

/// Role-specific flavor attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleFlavor {
    Analytical {
        logical_approach: String,
        data_integration: String,
        emotional_consideration: String,
    },
    Creative {
        creative_approach: String,
        intuitive_insight: String,
        factual_emphasis: String,
    },
    Chaotic {
        chaotic_element: String,
        wild_logic: String,
        unexpected_persona: String,
    },
}

impl RoleFlavor {
    fn generate<R: Rng + ?Sized>(role: DebaterRole, rng: &mut R) -> Self {
        let [a, b, c] = pool(role).flavor;
        match role {
            DebaterRole::Analytical => RoleFlavor::Analytical {
                logical_approach: pick(a, rng),
                data_integration: pick(b, rng),
                emotional_consideration: pick(c, rng),
            },
            DebaterRole::Creative => RoleFlavor::Creative {
                creative_approach: pick(a, rng),
                intuitive_insight: pick(b, rng),
                factual_emphasis: pick(c, rng),
            },
            DebaterRole::Chaotic => RoleFlavor::Chaotic {
                chaotic_element: pick(a, rng),
                wild_logic: pick(b, rng),
                unexpected_persona: pick(c, rng),
            },
        }
    }

    /// The role this flavor belongs to
    pub fn role(&self) -> DebaterRole {
        match self {
            RoleFlavor::Analytical { .. } => DebaterRole::Analytical,
            RoleFlavor::Creative { .. } => DebaterRole::Creative,
            RoleFlavor::Chaotic { .. } => DebaterRole::Chaotic,
        }
    }

    /// Flavor attributes in declaration order
    pub fn attributes(&self) -> [&str; 3] {
        match self {
            RoleFlavor::Analytical {
                logical_approach,
                data_integration,
                emotional_consideration,
            } => [
                logical_approach.as_str(),
                data_integration.as_str(),
                emotional_consideration.as_str(),
            ],
            RoleFlavor::Creative {
                creative_approach,
                intuitive_insight,
                factual_emphasis,
            } => [
                creative_approach.as_str(),
                intuitive_insight.as_str(),
                factual_emphasis.as_str(),
            ],
            RoleFlavor::Chaotic {
                chaotic_element,
                wild_logic,
                unexpected_persona,
            } => [
                chaotic_element.as_str(),
                wild_logic.as_str(),
                unexpected_persona.as_str(),
            ],
        }
    }
}

/// A generated personality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityProfile {
    /// Base disposition (e.g. "analytical and data-driven")
    pub base_personality: String,
    /// Two styles joined with " and "
    pub debate_style: String,
    /// The role's full key-trait list
    pub key_traits: Vec<String>,
    /// Area of expertise
    pub expertise: String,
    /// Preferred argument form
    pub preferred_argument: String,
    /// Known weakness
    pub weakness: String,
    /// Closing signature
    pub signature: String,
    /// Role-specific flavor
    pub flavor: RoleFlavor,
}

impl PersonalityProfile {
    /// Generate a profile for `role` from its fixed pools.
    pub fn generate<R: Rng + ?Sized>(role: DebaterRole, rng: &mut R) -> Self {
        let pool = pool(role);
        let first = pick(pool.debate_styles, rng);
        let second = pick(pool.debate_styles, rng);

        Self {
            base_personality: pool.base_personality.to_string(),
            debate_style: format!("{} and {}", first, second),
            key_traits: pool.key_traits.iter().map(|t| t.to_string()).collect(),
            expertise: pick(pool.expertise_areas, rng),
            preferred_argument: pick(pool.argument_preferences, rng),
            weakness: pick(pool.weaknesses, rng),
            signature: pool.signature.to_string(),
            flavor: RoleFlavor::generate(role, rng),
        }
    }

    /// Role this profile was generated for
    pub fn role(&self) -> DebaterRole {
        self.flavor.role()
    }
}
