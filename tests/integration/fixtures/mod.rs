// Screenplay fixtures with known casts
// WHY: Golden rosters need deterministic screenplay inputs

/// Three scenes: GWEN LAWSON, PETER LAWSON, then GWEN alone
pub const LAWSON_SCRIPT: &str = r#"INT. FERRY - DAY

Rain streaks the windows. Gwen stares at the water.

                    GWEN LAWSON
          I should never have come back.

EXT. HARBOR - NIGHT

                    PETER LAWSON
          She always hated the water.

INT. FERRY - CONTINUOUS

                    GWEN
          Peter?
"#;

/// Screenplay exercising transitions, generic roles, page markers and extensions
pub const FERRY_SCRIPT: &str = r#"FADE IN:

INT. FERRY - DAY

Rain streaks the windows. Gwen stares at the water.

                    GWEN LAWSON
          I should never have come back.

                    WAITER
          Coffee, ma'am?

                    GWEN LAWSON (CONT'D)
                    (quietly)
          No. Thank you.

                                        (MORE)

CUT TO:

EXT. HARBOR - NIGHT

A foghorn. Headlights sweep the pier.

                    PETER LAWSON (V.O.)
          She always hated the water.

                    POLICE OFFICER #2
          Move along.

                    CONTINUED

INT. FERRY - CONTINUOUS

                    GWEN
          Peter?

                    PETER
          You knew I'd come.

                    GWEN
          I hoped you wouldn't.

SMASH CUT TO:

12 EXT. PIER - LATER

                    ROSA DIAZ
          Last boat leaves at six.

THE END
"#;

/// Headings in several cases, each followed by dialogue-looking lines
pub const HEADING_CASES_SCRIPT: &str = "INT. FERRY - DAY\nWhat now?\n\nint. ferry - day\nWhat now?\n\nInt. Ferry - Day\nWhat now?\n\n    INT. FERRY - DAY\n          What now?\n";

/// Prose with no headings and no cues
pub const NO_CUES_TEXT: &str = "Chapter one.\n\nIt was a dark and stormy night. Nobody spoke.\n";

/// Generate a long screenplay with a recurring cast for throughput tests
pub fn generate_screenplay(scene_count: usize) -> String {
    let cast = ["GWEN LAWSON", "PETER LAWSON", "ROSA DIAZ", "GWEN", "WAITER", "PETER (O.S.)"];
    let mut text = String::from("FADE IN:\n\n");
    for scene in 1..=scene_count {
        let place = if scene % 2 == 0 { "EXT. HARBOR - NIGHT" } else { "INT. FERRY - DAY" };
        text.push_str(&format!("{scene} {place}\n\nThe ferry rocks against the pier.\n\n"));
        for line in 0..4 {
            let speaker = cast[(scene + line) % cast.len()];
            text.push_str(&format!(
                "                    {speaker}\n          Line {line} of scene {scene}.\n\n"
            ));
        }
        text.push_str("CUT TO:\n\n");
    }
    text
}
