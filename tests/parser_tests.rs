use devpulse::parser::parse_stack;
use devpulse::payload::StackFrame;
use pretty_assertions::assert_eq;

const CHROME_TRACE: &str = "TypeError: Cannot read properties of undefined (reading 'id')
    at renderUser (https://app.example.com/static/js/main.4f2a.js:120:31)
    at https://app.example.com/static/js/main.4f2a.js:88:14
    at Array.map (<anonymous>)
    at HTMLButtonElement.onClick (https://app.example.com/static/js/main.4f2a.js:45:9)";

#[test]
fn test_parse_chrome_trace() {
    let frames = parse_stack(Some(CHROME_TRACE));

    assert_eq!(frames.len(), 4);
    assert_eq!(
        frames[0],
        StackFrame::Located {
            function: Some("renderUser".to_string()),
            file: "https://app.example.com/static/js/main.4f2a.js".to_string(),
            line: Some(120),
            column: Some(31),
        }
    );
    assert_eq!(
        frames[1],
        StackFrame::Located {
            function: None,
            file: "https://app.example.com/static/js/main.4f2a.js".to_string(),
            line: Some(88),
            column: Some(14),
        }
    );
    assert_eq!(frames[2].raw(), Some("at Array.map (<anonymous>)"));
    assert_eq!(
        frames[3].file(),
        Some("https://app.example.com/static/js/main.4f2a.js")
    );
}

#[test]
fn test_header_line_is_always_discarded() {
    // Header that itself looks like a frame is still dropped
    let frames = parse_stack(Some("at first (a.js:1:1)\n  at second (b.js:2:2)"));
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].file(), Some("b.js"));
}

#[test]
fn test_frame_count_bounded_by_lines() {
    let traces = [
        "Error",
        "Error\n",
        "Error\n  at a (a.js:1:1)",
        "Error\nnoise\nmore noise\n  at x.js:3:3",
        CHROME_TRACE,
    ];

    for trace in traces {
        let lines = trace.split('\n').count();
        let frames = parse_stack(Some(trace));
        assert!(frames.len() <= lines - 1, "too many frames for {:?}", trace);
        assert!(frames.iter().all(|f| f.file().is_some() || f.raw().is_some()));
        assert!(frames.iter().all(StackFrame::has_content));
    }
}

#[test]
fn test_order_is_preserved() {
    let frames = parse_stack(Some(
        "Error\n  at inner (a.js:1:1)\n  at middle (a.js:2:1)\n  at outer (a.js:3:1)",
    ));
    let names: Vec<_> = frames
        .iter()
        .map(|f| match f {
            StackFrame::Located { function, .. } => function.clone().unwrap_or_default(),
            StackFrame::Raw { raw } => raw.clone(),
        })
        .collect();
    assert_eq!(names, vec!["inner", "middle", "outer"]);
}

#[test]
fn test_frames_serialize_to_wire_shape() {
    let frames = parse_stack(Some("Error\n  at myFn (http://h/app.js:10:5)\n  weird line"));
    assert_eq!(
        serde_json::to_value(&frames).unwrap(),
        serde_json::json!([
            {"function": "myFn", "file": "http://h/app.js", "line": 10, "column": 5},
            {"raw": "weird line"}
        ])
    );
}
