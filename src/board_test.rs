use super::*;

#[test]
fn default_registry_has_active_default_board() {
    let registry = BoardRegistry::default();
    assert_eq!(registry.active().as_str(), DEFAULT_BOARD_ID);
    assert_eq!(registry.boards(), &[BoardId::default_board()]);
}

#[test]
fn create_board_registers_without_activating() {
    let mut registry = BoardRegistry::default();
    let id = registry.create_board();
    assert!(id.as_str().starts_with("board-"));
    assert!(registry.contains(&id));
    assert_eq!(registry.active(), &BoardId::default_board());
}

#[test]
fn created_ids_are_unique() {
    let mut registry = BoardRegistry::default();
    let a = registry.create_board();
    let b = registry.create_board();
    assert_ne!(a, b);
    assert_eq!(registry.boards().len(), 3);
}

#[test]
fn set_active_switches_pointer() {
    let mut registry = BoardRegistry::default();
    let id = registry.create_board();
    registry.set_active(&id).unwrap();
    assert!(registry.is_active(&id));
}

#[test]
fn set_active_unknown_board_fails_and_keeps_pointer() {
    let mut registry = BoardRegistry::default();
    let ghost = BoardId::parse("ghost").unwrap();
    let err = registry.set_active(&ghost).unwrap_err();
    assert_eq!(err, BoardError::UnknownBoard(ghost));
    assert_eq!(err.error_code(), "E_UNKNOWN_BOARD");
    assert!(!err.retryable());
    assert_eq!(registry.active(), &BoardId::default_board());
}

#[test]
fn adopt_registers_external_id_once() {
    let mut registry = BoardRegistry::default();
    let id = BoardId::parse("board-1717000000000").unwrap();
    assert!(registry.adopt(id.clone()));
    assert!(!registry.adopt(id.clone()));
    assert_eq!(registry.boards().len(), 2);
    registry.set_active(&id).unwrap();
}

#[test]
fn parse_rejects_blank_ids() {
    assert!(matches!(BoardId::parse(""), Err(BoardError::InvalidId(_))));
    assert!(matches!(BoardId::parse(" padded "), Err(BoardError::InvalidId(_))));
    assert_eq!(BoardId::parse("tab-2").unwrap().to_string(), "tab-2");
}

#[test]
fn board_id_serializes_as_plain_string() {
    let json = serde_json::to_string(&BoardId::default_board()).unwrap();
    assert_eq!(json, "\"default\"");
}
