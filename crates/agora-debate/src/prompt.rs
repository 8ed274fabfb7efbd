//! Prompt composition
//!
//! A [`GenerationPrompt`] is an ordered list of named sections. The persona
//! section becomes the system text of the completion request; every other
//! section is rendered, in order, into the user message. The debater's role
//! picks the sampling temperature and the response length caps the token
//! budget. Composition is pure apart from the injected rng (wildcard stance).

use agora_core::{Band, ControlParameters, Debater, DebaterRole, ResponseLength, RoleFlavor};
use agora_knowledge::RetrievalResult;
use agora_llm::LlmRequest;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Stances a debater may be nudged into for a single turn
pub const WILDCARD_STANCES: [&str; 4] = [
    "contrarian",
    "devil's advocate",
    "peacemaker",
    "radical thinker",
];

/// One named block of a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSection {
    pub name: &'static str,
    pub body: String,
}

/// A fully composed generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationPrompt {
    pub sections: Vec<PromptSection>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationPrompt {
    /// Section by name
    pub fn section(&self, name: &str) -> Option<&PromptSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Persona text
    pub fn system(&self) -> &str {
        self.section("persona").map(|s| s.body.as_str()).unwrap_or_default()
    }

    /// Every non-persona section, blank-line separated
    pub fn render(&self) -> String {
        self.sections
            .iter()
            .filter(|s| s.name != "persona")
            .map(|s| s.body.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn into_request(self) -> LlmRequest {
        LlmRequest::new(self.system(), self.render())
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
    }
}

/// Analysts sample cooler than the creative voice; the wildcard runs hottest
fn temperature(role: DebaterRole) -> f32 {
    match role {
        DebaterRole::Analytical => 0.6,
        DebaterRole::Creative => 0.9,
        DebaterRole::Chaotic => 1.2,
    }
}

/// Headroom over the requested length; [`ResponseLength::enforce`] trims the rest
fn token_budget(length: ResponseLength) -> u32 {
    match length {
        ResponseLength::VeryShort => 60,
        ResponseLength::Short => 120,
        ResponseLength::Medium => 200,
        ResponseLength::Long => 400,
    }
}

/// Everything the composer reads for one turn
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub debater: &'a Debater,
    pub topic: &'a str,
    pub controls: &'a ControlParameters,
    /// Rendered conversation window
    pub context: &'a str,
    pub grounding: Option<&'a RetrievalResult>,
    pub background: Option<&'a str>,
    /// Phase instruction, user guidance or a regeneration request
    pub directive: &'a str,
    pub opponents: &'a [String],
}

fn persona(debater: &Debater) -> String {
    let p = &debater.profile;
    let traits = p.key_traits.join(", ");
    let signature = debater.signature();
    match &p.flavor {
        RoleFlavor::Analytical {
            logical_approach,
            data_integration,
            emotional_consideration,
        } => format!(
            "You are {}, an AI with a {} personality and a {} debate style. \
             Your key traits include {}. You specialize in {} and prefer using {} in your arguments. \
             In this debate, you're employing an approach that {} and {}. \
             Remember that your style {} in your arguments.\n{}",
            debater.name,
            p.base_personality,
            p.debate_style,
            traits,
            p.expertise,
            p.preferred_argument,
            logical_approach,
            data_integration,
            emotional_consideration,
            signature
        ),
        RoleFlavor::Creative {
            creative_approach,
            intuitive_insight,
            factual_emphasis,
        } => format!(
            "You are {}, an AI with a {} personality and a {} debate style. \
             Your key traits include {}. You specialize in {} and prefer using {} in your arguments. \
             In this debate, your approach {} and your intuition {}. \
             Remember that your style {} in your arguments.\n{}",
            debater.name,
            p.base_personality,
            p.debate_style,
            traits,
            p.expertise,
            p.preferred_argument,
            creative_approach,
            intuitive_insight,
            factual_emphasis,
            signature
        ),
        RoleFlavor::Chaotic {
            chaotic_element,
            wild_logic,
            unexpected_persona,
        } => format!(
            "You are {}, {} whose debate style is {}. \
             You often speak your mind without filtering your thoughts, and you're not afraid to express your emotions. \
             In this debate, you {}, you {}, and you {}.\n{}",
            debater.name,
            p.base_personality,
            p.debate_style,
            chaotic_element,
            wild_logic,
            unexpected_persona,
            signature
        ),
    }
}

fn role_instructions(debater: &Debater) -> String {
    match &debater.profile.flavor {
        RoleFlavor::Analytical {
            logical_approach,
            data_integration,
            emotional_consideration,
        } => format!(
            "Your reasoning {}. Your use of data {}. \
             While maintaining your analytical approach, acknowledge the role of human emotions \
             and experiences in this debate: your style {}.",
            logical_approach, data_integration, emotional_consideration
        ),
        RoleFlavor::Creative {
            creative_approach,
            intuitive_insight,
            factual_emphasis,
        } => format!(
            "Your thinking {}. Your intuition {} for unique perspectives. \
             While maintaining your creative approach, provide concrete examples and data to \
             support your points: your style {}.",
            creative_approach, intuitive_insight, factual_emphasis
        ),
        RoleFlavor::Chaotic {
            chaotic_element,
            wild_logic,
            unexpected_persona,
        } => format!(
            "Embrace your chaotic nature! Be wildly unpredictable in every response.\n\
             Use a different approach each time, which may include:\n\
             - a debater who {}\n\
             - logic that {}\n\
             - a voice that {}\n\
             - Inventing new debate tactics on the spot\n\
             - Misinterpreting others in the most ridiculous way possible\n\
             - Introducing completely unrelated topics and insisting they're relevant\n\
             Your primary goal is to be entertaining, provocative, and disruptive. \
             Never stick to one persona or style of response.",
            chaotic_element, wild_logic, unexpected_persona
        ),
    }
}

fn humor_instruction(humor: f64) -> &'static str {
    if humor <= 0.3 {
        "Maintain a serious and formal tone in your arguments."
    } else if humor <= 0.7 {
        "Occasionally incorporate humor into your arguments to make them more engaging."
    } else {
        "Use humor freely in your arguments, including witty banter and name-calling."
    }
}

fn grounding_block(grounding: Option<&RetrievalResult>) -> String {
    match grounding {
        Some(result) if result.is_grounded() => {
            let points = result
                .key_points
                .iter()
                .map(|p| format!("- {}", p))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "Here is some relevant information on the topic:\n{}\n\nKey points:\n{}\n\n\
                 Use this information to support your arguments or provide counterpoints. \
                 Critically evaluate its relevance and accuracy, and acknowledge it if the \
                 information seems incomplete or biased.",
                result.summary.as_deref().unwrap_or_default(),
                points
            )
        }
        Some(result) if !result.related_topics.is_empty() => format!(
            "No direct information found on the topic. Consider exploring these related areas \
             in your argument:\n{}",
            result
                .related_topics
                .iter()
                .take(5)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ),
        _ => "No direct information found on the topic or related areas. Feel free to explore \
              theoretical aspects or general knowledge to support your arguments."
            .to_string(),
    }
}

fn respond_to(opponents: &[String]) -> String {
    match opponents {
        [] => "Address the audience directly and set out your own position.".to_string(),
        [only] => format!("Respond to {}'s last point.", only),
        [first, rest @ ..] => format!(
            "Respond to {}'s last point and consider anything mentioned by {} that could add \
             to or challenge the current discussion.",
            first,
            rest.join(" or ")
        ),
    }
}

/// Compose the generation request for one turn
pub fn compose<R: Rng + ?Sized>(ctx: &PromptContext<'_>, rng: &mut R) -> GenerationPrompt {
    let debater = ctx.debater;
    let profile = &debater.profile;
    let controls = ctx.controls;
    let length = controls.length.directive();

    let mut sections = Vec::with_capacity(24);
    let mut push = |name: &'static str, body: String| sections.push(PromptSection { name, body });

    push("persona", persona(debater));
    push("topic", format!("The current topic of debate is: {}", ctx.topic));
    push("humor", humor_instruction(debater.humor).to_string());
    push(
        "context",
        format!("Context of the conversation so far:\n{}", ctx.context),
    );
    push("directive", format!("User Guidance: {}", ctx.directive));
    push("grounding", grounding_block(ctx.grounding));
    if let Some(background) = ctx.background.filter(|b| !b.trim().is_empty()) {
        push(
            "background",
            format!(
                "**Online Scrape Summary:**\n\n{}\n\nUse this information to gain a deeper \
                 understanding of the debate topic, support your arguments, and offer \
                 counterpoints.",
                background.trim()
            ),
        );
    }
    push("role", role_instructions(debater));
    push("respond", respond_to(ctx.opponents));

    push(
        "directness",
        match Band::from_level(debater.directness) {
            Band::High => "Be highly direct and call out things that you know are wrong.",
            Band::Medium => "Be moderately direct.",
            Band::Low => "Be somewhat indirect.",
        }
        .to_string(),
    );
    push(
        "assertiveness",
        match Band::from_level(debater.assertiveness) {
            Band::High => "Be very assertive and stand firmly by your points.",
            Band::Medium => "Be moderately assertive in your arguments.",
            Band::Low => "Be mildly assertive.",
        }
        .to_string(),
    );
    push(
        "controversy",
        match Band::from_level(controls.controversy) {
            Band::High => {
                "Your arguments should be highly controversial and challenge conventional wisdom."
            }
            Band::Medium => "Your arguments should be moderately provocative.",
            Band::Low => "Your arguments should be mildly challenging.",
        }
        .to_string(),
    );
    push(
        "complexity",
        match Band::from_level(controls.complexity) {
            Band::High => "Use sophisticated vocabulary and layered, technical reasoning.",
            Band::Medium => "Use clear language with moderate technical depth.",
            Band::Low => "Use plain, simple language that anyone can follow.",
        }
        .to_string(),
    );
    push(
        "evidence",
        format!(
            "Provide specific examples, analogies, or evidence to support your arguments, \
             preferably using your preferred argument style of {}. If appropriate, challenge \
             the other debaters to provide evidence for their claims.",
            profile.preferred_argument
        ),
    );
    push(
        "topic_evolution",
        if controls.topic_evolution <= 0.0 {
            "Stay strictly on the current topic; do not introduce subtopics.".to_string()
        } else {
            format!(
                "If appropriate (with a probability of {:.2}), introduce a relevant subtopic or \
                 expand the discussion to a related area, possibly drawing from your expertise \
                 in {}.",
                controls.topic_evolution, profile.expertise
            )
        },
    );
    push(
        "consistency",
        "Maintain consistency with your previous arguments, but don't be afraid to evolve your \
         position if presented with compelling counterarguments. If you change your stance, \
         explicitly acknowledge it."
            .to_string(),
    );
    push(
        "perspective",
        format!(
            "As {} with a {} personality and a {} debate style, leverage your unique traits: {}. \
             Don't just respond to the other debaters' points, but also introduce your own novel \
             ideas and perspectives on the topic.",
            debater.name,
            profile.base_personality,
            profile.debate_style,
            profile.key_traits.join(", ")
        ),
    );
    push(
        "wildcard",
        format!(
            "Occasionally, act as a {} to add an unexpected element to the debate.",
            WILDCARD_STANCES.choose(rng).copied().unwrap_or("contrarian")
        ),
    );
    push(
        "weakness",
        format!(
            "Be aware of your potential weakness: {}. Try to compensate for it, but it's okay if \
             it occasionally shows in your arguments.",
            profile.weakness
        ),
    );
    push(
        "style",
        format!(
            "Use a {} tone, with a focus on being {}. {}",
            controls.tone, controls.focus, length
        ),
    );
    if debater.role.enforces_length() {
        push(
            "length_enforcement",
            format!(
                "CRITICAL INSTRUCTION FOR {}: {} You must strictly adhere to this length \
                 requirement. This is crucial for maintaining the debate structure.",
                debater.name.to_uppercase(),
                length
            ),
        );
    }
    push("closing", "Your response:".to_string());

    GenerationPrompt {
        sections,
        temperature: temperature(debater.role),
        max_tokens: token_budget(controls.length),
    }
}
