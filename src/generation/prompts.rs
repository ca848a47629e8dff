//! Prompt composition for the three generation calls.
//!
//! Everything here is pure: same request and context in, same text out.

use crate::models::{NarrativeStructure, PlotGenerationRequest, ProjectContext};

/// Only the opening chapters are folded into prompts.
const CONTEXT_CHAPTER_LIMIT: usize = 3;

/// Chapter excerpts are cut to this many characters.
const CHAPTER_EXCERPT_CHARS: usize = 600;

const ACT_JSON_SHAPE: &str = r#"{
  "acts": [
    {
      "actNumber": 1,
      "name": "Act name",
      "description": "What this act accomplishes",
      "plotPoints": [
        {
          "type": "inciting_incident | rising_action | midpoint | turning_point | climax | resolution",
          "title": "Short title",
          "description": "What happens",
          "importance": "major | minor",
          "position": 10
        }
      ]
    }
  ]
}"#;

const SUGGESTION_JSON_SHAPE: &str = r#"[
  {
    "type": "plot_twist | character_arc | subplot | conflict_escalation | resolution_path | theme_development",
    "title": "Short title",
    "description": "The suggestion",
    "impact": "How it changes the story"
  }
]"#;

/// System text sent with every generation request.
pub fn system_prompt() -> &'static str {
    "You are an experienced story editor and plot architect. \
     You design coherent, well-paced narrative structures and always answer \
     with valid JSON in exactly the shape requested, without commentary."
}

/// Prompt for the main plot structure.
pub fn structure_prompt(request: &PlotGenerationRequest, context: Option<&ProjectContext>) -> String {
    let target = request.target_length_or_default();
    let mut prompt = format!(
        "Create a plot structure for a {} story of about {} chapters.\n\n",
        request.genre.trim(),
        target
    );

    push_request_details(&mut prompt, request);

    if let Some(ctx) = context.filter(|c| !c.is_empty()) {
        push_context(&mut prompt, ctx);
    }

    prompt.push_str("\n## Structure\n");
    prompt.push_str(&structure_instructions(request.structure));
    prompt.push_str(
        "\nEvery act must contain at least one plot point. Include exactly one plot point of \
         type \"climax\" and one of type \"resolution\". Positions are percentages (0-100) \
         through the whole story and must increase monotonically.\n",
    );

    prompt.push_str("\n## Response format\nRespond with JSON only, in this shape:\n");
    prompt.push_str(ACT_JSON_SHAPE);
    prompt.push('\n');
    prompt
}

/// Prompt for 3-5 improvement suggestions.
pub fn suggestions_prompt(
    request: &PlotGenerationRequest,
    context: Option<&ProjectContext>,
) -> String {
    let mut prompt = format!(
        "Suggest 3 to 5 ways to strengthen a {} story.\n\n",
        request.genre.trim()
    );

    push_request_details(&mut prompt, request);

    if let Some(ctx) = context.filter(|c| !c.is_empty()) {
        push_context(&mut prompt, ctx);
    }

    let has_characters = !request.characters.is_empty()
        || context.is_some_and(|c| !c.existing_characters.is_empty());
    if has_characters || !request.themes.is_empty() {
        prompt.push_str(
            "\nBuild on the existing characters and themes rather than replacing them.\n",
        );
    }

    prompt.push_str(
        "\nUse a mix of suggestion types: plot_twist, character_arc, subplot, \
         conflict_escalation, resolution_path, theme_development.\n",
    );
    prompt.push_str("\n## Response format\nRespond with a JSON array only, in this shape:\n");
    prompt.push_str(SUGGESTION_JSON_SHAPE);
    prompt.push('\n');
    prompt
}

/// Prompt for alternative opening acts.
pub fn alternatives_prompt(
    request: &PlotGenerationRequest,
    context: Option<&ProjectContext>,
) -> String {
    let mut prompt = format!(
        "Propose 2 or 3 alternative opening acts for a {} story. Each alternative should \
         start the story differently while keeping the premise intact.\n\n",
        request.genre.trim()
    );

    push_request_details(&mut prompt, request);

    if let Some(ctx) = context.filter(|c| !c.is_empty()) {
        push_context(&mut prompt, ctx);
    }

    prompt.push_str(
        "\nReturn each alternative as its own act; number them 1, 2, 3.\n\
         \n## Response format\nRespond with JSON only, in this shape:\n",
    );
    prompt.push_str(ACT_JSON_SHAPE);
    prompt.push('\n');
    prompt
}

fn push_request_details(prompt: &mut String, request: &PlotGenerationRequest) {
    prompt.push_str(&format!("## Premise\n{}\n", request.premise.trim()));
    prompt.push_str(&format!("\n## Genre\n{}\n", request.genre.trim()));
    prompt.push_str(&format!(
        "\n## Target length\n{} chapters\n",
        request.target_length_or_default()
    ));

    prompt.push_str("\n## Characters\n");
    if request.characters.is_empty() {
        prompt.push_str("None given. Invent a small, memorable cast that fits the premise.\n");
    } else {
        for name in &request.characters {
            prompt.push_str(&format!("- {}\n", name));
        }
    }

    if !request.themes.is_empty() {
        prompt.push_str(&format!("\n## Themes\n{}\n", request.themes.join(", ")));
    }

    if let Some(tone) = request.tone.as_deref().filter(|t| !t.trim().is_empty()) {
        prompt.push_str(&format!("\n## Tone\n{}\n", tone.trim()));
    }

    if !request.plot_points.is_empty() {
        prompt.push_str("\n## Plot points to honor\n");
        for hint in &request.plot_points {
            prompt.push_str(&format!("- {}\n", hint));
        }
    }
}

fn push_context(prompt: &mut String, ctx: &ProjectContext) {
    prompt.push_str("\n## Existing project\n");

    if !ctx.existing_characters.is_empty() {
        prompt.push_str("Established characters:\n");
        for character in &ctx.existing_characters {
            let role = if character.role.trim().is_empty() {
                String::new()
            } else {
                format!(" ({})", character.role.trim())
            };
            let traits = &character.psychology.personality_traits;
            if traits.is_empty() {
                prompt.push_str(&format!("- {}{}\n", character.name, role));
            } else {
                prompt.push_str(&format!(
                    "- {}{}: {}\n",
                    character.name,
                    role,
                    traits.join(", ")
                ));
            }
        }
    }

    if let Some(world) = ctx.world_building.as_deref().filter(|w| !w.trim().is_empty()) {
        prompt.push_str(&format!("\nWorld:\n{}\n", world.trim()));
    }

    if !ctx.chapters.is_empty() {
        prompt.push_str("\nOpening chapters:\n");
        for chapter in ctx.chapters.iter().take(CONTEXT_CHAPTER_LIMIT) {
            prompt.push_str(&format!(
                "### {}\n{}\n",
                chapter.display_name(),
                crate::utils::text::truncate_words(&chapter.content, CHAPTER_EXCERPT_CHARS)
            ));
        }
    }

    if !ctx.metadata.is_empty() {
        let mut keys: Vec<_> = ctx.metadata.keys().collect();
        keys.sort();
        prompt.push_str("\nNotes:\n");
        for key in keys {
            prompt.push_str(&format!("- {}: {}\n", key, ctx.metadata[key]));
        }
    }
}

fn structure_instructions(structure: Option<NarrativeStructure>) -> String {
    match structure.unwrap_or(NarrativeStructure::ThreeAct) {
        NarrativeStructure::ThreeAct => "Use a three-act structure: setup, confrontation, \
             resolution. The inciting incident lands early in act 1; the climax late in act 3."
            .to_string(),
        NarrativeStructure::FiveAct => "Use a five-act structure: exposition, rising action, \
             climax, falling action, denouement."
            .to_string(),
        NarrativeStructure::HerosJourney => "Follow the hero's journey: ordinary world, call \
             to adventure, refusal, meeting the mentor, crossing the threshold, tests and \
             allies, the ordeal, the reward, the road back, resurrection, return with the \
             elixir. Group these stages into acts."
            .to_string(),
        NarrativeStructure::Kishotenketsu => "Use kishōtenketsu in four acts: introduction \
             (ki), development (shō), twist (ten), reconciliation (ketsu). Conflict is \
             optional; the twist reframes what came before."
            .to_string(),
        NarrativeStructure::Custom => "Design a custom structure that best serves this \
             premise. Choose the number of acts yourself and name each one."
            .to_string(),
    }
}
