use rostra_core::debate::{Debate, Participant, Role};
use rostra_core::ids::ParticipantId;
use rostra_core::research::ResearchBundle;
use rostra_core::summary::VoteTally;
use rostra_core::turn::{Turn, TurnType};
use rostra_core::verdict::ClaimVerdict;

/// How a side's position is phrased in queries and framings.
pub fn side_phrase(role: Role) -> &'static str {
    match role {
        Role::Con => "against",
        _ => "in favor of",
    }
}

pub fn debater_system(debate: &Debate, participant: &Participant) -> String {
    let mut system = format!(
        "You are {name}, debating {side} the motion: \"{topic}\".",
        name = participant.display_name,
        side = side_phrase(participant.role),
        topic = debate.topic,
    );
    if !participant.persona.is_empty() {
        system.push_str(&format!("\nPersona: {}", participant.persona));
    }
    system.push_str(
        "\nArgue your side persuasively and concretely. Never concede the motion. \
         Respond with a single JSON object: \
         {\"argument\": \"your full spoken argument\", \
          \"citations\": [{\"label\": \"source name\", \"url\": \"optional url\"}], \
          \"claims\": [\"each individually checkable factual claim you made\"]}",
    );
    system
}

/// Guidance for the position in the debate.
fn turn_instruction(kind: TurnType) -> &'static str {
    match kind {
        TurnType::Opening => "Deliver your opening statement. Lay out your strongest case.",
        TurnType::Rebuttal => {
            "Deliver a rebuttal. Engage your opponent's most recent argument directly and quote \
             their words where you dispute them."
        }
        TurnType::Closing => "Deliver your closing statement. Consolidate the debate in your favor.",
    }
}

pub fn turn_request(
    debate: &Debate,
    participant: &Participant,
    turn_no: u32,
    kind: TurnType,
    history: &[Turn],
    research: &ResearchBundle,
) -> String {
    // Rough speaking budget at a typical delivery rate.
    let word_budget = debate.config.turn_seconds * 150 / 60;

    let mut request = format!(
        "Turn {turn_no} of {max}. {instruction}\nAim for roughly {word_budget} words.\n",
        max = debate.config.max_turns,
        instruction = turn_instruction(kind),
    );

    let rendered = render_history(history, &participant.id);
    if !rendered.is_empty() {
        request.push_str("\nDebate so far:\n");
        request.push_str(&rendered);
    }

    if !research.context.is_empty() {
        request.push_str("\nResearch context for your side:\n");
        request.push_str(&research.context);
    }

    if !research.sources.is_empty() {
        request.push_str("\nDocuments you may cite:\n");
        for source in &research.sources {
            request.push_str(&format!("- {} ({})\n", source.title, source.url));
        }
    }

    request
}

/// Prior turns from the new speaker's perspective: their own turns are
/// "You", everything else is "Opponent".
pub fn render_history(history: &[Turn], self_id: &ParticipantId) -> String {
    let mut out = String::new();
    for turn in history {
        let speaker = if &turn.participant_id == self_id { "You" } else { "Opponent" };
        out.push_str(&format!(
            "{speaker} ({kind}, turn {no}): {argument}\n\n",
            kind = turn.turn_type,
            no = turn.turn_no,
            argument = turn.argument,
        ));
    }
    out
}

pub fn verifier_system() -> String {
    "You are a rigorous real-time fact checker for a live debate. Judge each claim strictly on \
     the evidence. Respond with a single JSON object: \
     {\"verdicts\": [{\"claim\": \"the claim verbatim\", \
       \"verdict\": \"true|mostly_true|mixed|mostly_false|false|unverifiable\", \
       \"explanation\": \"one or two sentences\", \
       \"confidence\": 0.0, \
       \"sources\": [\"url\"]}]} \
     with one entry per claim, in the order given."
        .to_string()
}

pub fn verification_request(topic: &str, argument: &str, claims: &[String], context: &str) -> String {
    let mut request = format!("Debate topic: {topic}\n\nFull argument for context:\n{argument}\n\nClaims to verify:\n");
    for (idx, claim) in claims.iter().enumerate() {
        request.push_str(&format!("{}. {claim}\n", idx + 1));
    }
    if !context.is_empty() {
        request.push_str("\nResearch material:\n");
        request.push_str(context);
    }
    request
}

pub fn summary_system() -> String {
    "You are the post-debate analyst. Assess the whole exchange dispassionately. Respond with a \
     single JSON object: \
     {\"overall_summary\": \"...\", \"winner_analysis\": \"...\", \
      \"accuracy_scores\": {\"participant display name\": 0.0}, \
      \"key_arguments\": [\"ranked, strongest first\"], \
      \"sources_used\": [{\"title\": \"...\", \"url\": \"...\", \"reliability\": 0.0}], \
      \"recommendations\": \"...\"}"
        .to_string()
}

pub fn summary_request(
    debate: &Debate,
    participants: &[Participant],
    transcript: &[Turn],
    verdicts: &[ClaimVerdict],
    tally: VoteTally,
) -> String {
    let mut request = format!("Debate topic: {}\n\nParticipants:\n", debate.topic);
    for participant in participants {
        request.push_str(&format!("- {} ({})\n", participant.display_name, participant.role));
    }

    request.push_str("\nTranscript:\n");
    for turn in transcript {
        request.push_str(&format!(
            "Turn {} ({}): {}\n\n",
            turn.turn_no, turn.turn_type, turn.argument
        ));
    }

    if !verdicts.is_empty() {
        request.push_str("Fact-check results:\n");
        for verdict in verdicts {
            request.push_str(&format!(
                "- \"{}\" — {} (confidence {:.2}){}\n",
                verdict.claim,
                verdict.verdict,
                verdict.confidence,
                if verdict.is_lie { " [flagged as lie]" } else { "" },
            ));
        }
        request.push('\n');
    }

    request.push_str(&format!(
        "Audience vote: {} pro, {} con.\n",
        tally.pro, tally.con
    ));
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use rostra_core::debate::{DebateConfig, DebateStatus};
    use rostra_core::ids::{DebateId, TurnId};

    fn debate() -> Debate {
        Debate {
            id: DebateId::new(),
            topic: "The four-day work week should be standard".into(),
            description: String::new(),
            status: DebateStatus::Live,
            config: DebateConfig::default(),
            created_at: "2026-08-01T00:00:00Z".into(),
            updated_at: "2026-08-01T00:00:00Z".into(),
        }
    }

    fn participant(role: Role, name: &str) -> Participant {
        Participant {
            id: ParticipantId::new(),
            debate_id: DebateId::new(),
            role,
            display_name: name.into(),
            persona: "Dry, numbers-first".into(),
            voice_id: String::new(),
            created_at: "2026-08-01T00:00:00Z".into(),
        }
    }

    fn turn(participant_id: &ParticipantId, turn_no: u32, argument: &str) -> Turn {
        Turn {
            id: TurnId::new(),
            debate_id: DebateId::new(),
            participant_id: participant_id.clone(),
            turn_no,
            turn_type: TurnType::Opening,
            argument: argument.into(),
            citations: vec![],
            sources: vec![],
            audio_url: None,
            created_at: "2026-08-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn system_framing_is_side_specific() {
        let debate = debate();
        let pro_framing = debater_system(&debate, &participant(Role::Pro, "Ada"));
        let con_framing = debater_system(&debate, &participant(Role::Con, "Ben"));

        assert!(pro_framing.contains("in favor of"));
        assert!(con_framing.contains("against"));
        assert!(pro_framing.contains(&debate.topic));
        assert!(pro_framing.contains("Dry, numbers-first"));
    }

    #[test]
    fn history_relabels_speakers_per_perspective() {
        let ada = participant(Role::Pro, "Ada");
        let ben = participant(Role::Con, "Ben");
        let history = vec![
            turn(&ada.id, 1, "productivity rises"),
            turn(&ben.id, 2, "payrolls cannot absorb it"),
        ];

        let from_ada = render_history(&history, &ada.id);
        assert!(from_ada.contains("You (opening, turn 1): productivity rises"));
        assert!(from_ada.contains("Opponent (opening, turn 2): payrolls cannot absorb it"));

        let from_ben = render_history(&history, &ben.id);
        assert!(from_ben.contains("Opponent (opening, turn 1)"));
        assert!(from_ben.contains("You (opening, turn 2)"));
    }

    #[test]
    fn turn_request_includes_research_and_documents() {
        let debate = debate();
        let ada = participant(Role::Pro, "Ada");
        let research = ResearchBundle::from_response(rostra_core::research::ResearchResponse {
            answer: "Trials show stable output.".into(),
            sources: vec![rostra_core::research::ResearchSource {
                title: "UK pilot study".into(),
                url: "https://pilot.example".into(),
                snippet: "61 firms".into(),
            }],
        });

        let request = turn_request(&debate, &ada, 3, TurnType::Rebuttal, &[], &research);
        assert!(request.contains("Trials show stable output."));
        assert!(request.contains("UK pilot study"));
        assert!(request.contains("rebuttal") || request.contains("Rebuttal"));
        // 60 seconds at 150 wpm
        assert!(request.contains("150 words"));
    }

    #[test]
    fn verification_request_numbers_claims() {
        let request = verification_request(
            "topic",
            "the argument",
            &["claim a".into(), "claim b".into()],
            "context text",
        );
        assert!(request.contains("1. claim a"));
        assert!(request.contains("2. claim b"));
        assert!(request.contains("context text"));
    }

    #[test]
    fn summary_request_carries_tally_and_flags() {
        let debate = debate();
        let ada = participant(Role::Pro, "Ada");
        let verdicts = vec![ClaimVerdict {
            id: rostra_core::ids::VerdictId::new(),
            debate_id: debate.id.clone(),
            turn_id: TurnId::new(),
            participant_id: ada.id.clone(),
            claim: "output fell 40%".into(),
            verdict: rostra_core::verdict::Verdict::False,
            explanation: "contradicted by the pilot data".into(),
            confidence: 0.95,
            is_lie: true,
            sources: vec![],
            created_at: "2026-08-01T00:00:00Z".into(),
        }];

        let request = summary_request(&debate, &[ada], &[], &verdicts, VoteTally { pro: 4, con: 1 });
        assert!(request.contains("4 pro, 1 con"));
        assert!(request.contains("[flagged as lie]"));
    }
}
