use super::*;

fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Shape {
    Shape::new(Geometry::Line(Segment { x1, y1, x2, y2 }), &Style::default())
}

// =============================================================
// Wire format
// =============================================================

#[test]
fn line_serializes_flat_with_type_tag() {
    let shape = line(0.0, 0.0, 10.0, 10.0).with_id(ShapeId::from("s-1"));
    let json = serde_json::to_value(&shape).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "id": "s-1",
            "type": "line",
            "x1": 0.0, "y1": 0.0, "x2": 10.0, "y2": 10.0,
            "color": "#000000",
            "width": 2
        })
    );
}

#[test]
fn squiggle_payload_from_store_parses_as_freeform() {
    let json = serde_json::json!({
        "id": "1717000000000",
        "type": "squiggle",
        "path": [{"x": 1, "y": 2}, {"x": 3, "y": 4}],
        "tool": "erase",
        "color": "white",
        "width": 20
    });
    let shape: Shape = serde_json::from_value(json).unwrap();
    assert_eq!(shape.id.as_str(), "1717000000000");
    assert!(shape.geometry.is_eraser());
    assert_eq!(shape.geometry.kind(), "erase");
    let Geometry::Freeform(path) = &shape.geometry else {
        panic!("expected freeform geometry");
    };
    assert_eq!(path.path, vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
}

#[test]
fn freeform_type_name_is_accepted_on_input() {
    let json = serde_json::json!({
        "id": "a",
        "type": "freeform",
        "path": [{"x": 0, "y": 0}, {"x": 1, "y": 1}]
    });
    let shape: Shape = serde_json::from_value(json).unwrap();
    assert_eq!(shape.geometry.kind(), "squiggle");
    assert!(!shape.geometry.is_eraser());
}

#[test]
fn missing_style_fields_fall_back_to_defaults() {
    let json = serde_json::json!({"id": "r", "type": "rect", "x1": 1, "y1": 1, "x2": 5, "y2": 5});
    let shape: Shape = serde_json::from_value(json).unwrap();
    assert_eq!(shape.color, DEFAULT_COLOR);
    assert_eq!(shape.stroke_width, DEFAULT_STROKE_WIDTH);
}

#[test]
fn mongo_style_id_and_extra_fields_are_tolerated() {
    let json = serde_json::json!({
        "_id": "665f",
        "boardId": "default",
        "__v": 0,
        "type": "circle",
        "x1": 0, "y1": 0, "x2": 3, "y2": 4,
        "color": "red",
        "width": 3
    });
    let shape: Shape = serde_json::from_value(json).unwrap();
    assert_eq!(shape.id.as_str(), "665f");
    assert_eq!(shape.geometry.kind(), "circle");
}

#[test]
fn id_wins_over_document_id_when_both_are_echoed() {
    let json = serde_json::json!({
        "id": "local-7",
        "_id": "665f",
        "type": "line",
        "x1": 0, "y1": 0, "x2": 1, "y2": 1,
        "color": "#000000",
        "width": 2
    });
    let shape: Shape = serde_json::from_value(json).unwrap();
    assert_eq!(shape.id.as_str(), "local-7");
    assert_eq!(shape.geometry.kind(), "line");
}

#[test]
fn listed_array_with_both_identifiers_decodes() {
    let text = r##"[{"id": "a", "_id": "1", "type": "rect", "x1": 0, "y1": 0, "x2": 2, "y2": 2, "color": "#111111", "width": 1}]"##;
    let shapes: Vec<Shape> = serde_json::from_str(text).unwrap();
    assert_eq!(shapes[0].id.as_str(), "a");
}

#[test]
fn shape_without_id_gets_one_assigned() {
    let json = serde_json::json!({"type": "line", "x1": 0, "y1": 0, "x2": 1, "y2": 1});
    let shape: Shape = serde_json::from_value(json).unwrap();
    assert!(!shape.id.as_str().is_empty());
}

#[test]
fn unknown_type_is_rejected() {
    let json = serde_json::json!({"id": "x", "type": "hexagon", "x1": 0, "y1": 0, "x2": 1, "y2": 1});
    assert!(serde_json::from_value::<Shape>(json).is_err());
}

// =============================================================
// Construction and validation
// =============================================================

#[test]
fn new_shapes_get_distinct_ids() {
    let a = line(0.0, 0.0, 1.0, 1.0);
    let b = line(0.0, 0.0, 1.0, 1.0);
    assert_ne!(a.id, b.id);
    assert!(a.same_content(&b));
}

#[test]
fn eraser_forces_background_color_and_width() {
    let style = Style { color: "#ff0000".into(), stroke_width: 4 };
    let path = Path { path: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)], tool: FreeformTool::Eraser };
    let shape = Shape::new(Geometry::Freeform(path), &style);
    assert_eq!(shape.color, BACKGROUND_COLOR);
    assert_eq!(shape.stroke_width, ERASER_WIDTH);
}

#[test]
fn validate_rejects_single_point_path() {
    let path = Path { path: vec![Point::new(0.0, 0.0)], tool: FreeformTool::Pen };
    let shape = Shape::new(Geometry::Freeform(path), &Style::default());
    assert_eq!(shape.validate(), Err(ShapeError::DegeneratePath { points: 1 }));
}

#[test]
fn validate_rejects_zero_stroke() {
    let mut shape = line(0.0, 0.0, 1.0, 1.0);
    shape.stroke_width = 0;
    assert_eq!(shape.validate(), Err(ShapeError::ZeroStrokeWidth));
    assert_eq!(ShapeError::ZeroStrokeWidth.error_code(), "E_ZERO_STROKE_WIDTH");
}

#[test]
fn validate_accepts_two_point_geometry() {
    assert!(line(5.0, 5.0, 5.0, 5.0).validate().is_ok());
}

#[test]
fn with_id_keeps_content() {
    let shape = line(1.0, 2.0, 3.0, 4.0);
    let renamed = shape.clone().with_id(ShapeId::from("other"));
    assert_eq!(renamed.id.as_str(), "other");
    assert!(renamed.same_content(&shape));
    assert_ne!(renamed, shape);
}

// =============================================================
// Bounds
// =============================================================

#[test]
fn rect_bounds_normalize_corners() {
    let shape = Shape::new(Geometry::Rect(Segment { x1: 10.0, y1: 0.0, x2: 0.0, y2: 5.0 }), &Style::default());
    let bounds = shape.bounds().unwrap();
    assert_eq!(bounds.min, Point::new(0.0, 0.0));
    assert_eq!(bounds.max, Point::new(10.0, 5.0));
}

#[test]
fn circle_bounds_use_radius_from_centre() {
    let shape = Shape::new(Geometry::Circle(Segment { x1: 0.0, y1: 0.0, x2: 3.0, y2: 4.0 }), &Style::default());
    let bounds = shape.bounds().unwrap();
    assert_eq!(bounds.min, Point::new(-5.0, -5.0));
    assert_eq!(bounds.max, Point::new(5.0, 5.0));
}

#[test]
fn empty_path_has_no_bounds() {
    let shape = Shape::new(Geometry::Freeform(Path { path: vec![], tool: FreeformTool::Pen }), &Style::default());
    assert!(shape.bounds().is_none());
}

// =============================================================
// Tools and gestures
// =============================================================

#[test]
fn tool_parses_names_and_aliases() {
    assert_eq!("rect".parse::<Tool>().unwrap(), Tool::Rect);
    assert_eq!("eraser".parse::<Tool>().unwrap(), Tool::Erase);
    assert_eq!("freeform".parse::<Tool>().unwrap(), Tool::Squiggle);
    assert_eq!("blob".parse::<Tool>(), Err(ShapeError::UnknownTool("blob".into())));
}

#[test]
fn line_gesture_uses_press_and_release_points() {
    let mut gesture = Gesture::begin(Tool::Line, Point::new(1.0, 1.0), Style::default());
    gesture.extend(Point::new(4.0, 4.0));
    let shape = gesture.finish(Point::new(9.0, 9.0)).unwrap();
    assert_eq!(shape.geometry, Geometry::Line(Segment { x1: 1.0, y1: 1.0, x2: 9.0, y2: 9.0 }));
}

#[test]
fn freehand_click_without_movement_is_discarded() {
    let gesture = Gesture::begin(Tool::Squiggle, Point::new(1.0, 1.0), Style::default());
    assert!(gesture.finish(Point::new(1.0, 1.0)).is_none());
}

#[test]
fn freehand_drag_keeps_trail() {
    let style = Style { color: "blue".into(), stroke_width: 3 };
    let mut gesture = Gesture::begin(Tool::Squiggle, Point::new(0.0, 0.0), style);
    gesture.extend(Point::new(1.0, 0.0));
    gesture.extend(Point::new(2.0, 0.0));
    let shape = gesture.finish(Point::new(2.0, 0.0)).unwrap();
    let Geometry::Freeform(path) = &shape.geometry else {
        panic!("expected freeform geometry");
    };
    assert_eq!(path.path.len(), 3);
    assert_eq!(shape.color, "blue");
    assert_eq!(shape.stroke_width, 3);
}

#[test]
fn erase_gesture_produces_eraser_path() {
    let mut gesture = Gesture::begin(Tool::Erase, Point::new(0.0, 0.0), Style::default());
    gesture.extend(Point::new(5.0, 5.0));
    let shape = gesture.finish(Point::new(5.0, 5.0)).unwrap();
    assert!(shape.geometry.is_eraser());
    assert_eq!(shape.color, BACKGROUND_COLOR);
}

#[test]
fn display_describes_shape() {
    let shape = line(0.0, 0.0, 10.0, 10.0).with_id(ShapeId::from("abc"));
    assert_eq!(shape.to_string(), "line abc (0, 0) -> (10, 10) #000000 w2");
}
