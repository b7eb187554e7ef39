//! Integration tests for the board.
//!
//! These drive the board the way the canvas does (gestures, drags, editor
//! sessions) and check the store, the controllers, the renderer calls and
//! what reaches the snapshot sink.

use chrono::NaiveDate;
use serde_json::Value;
use std::time::{Duration, Instant};
use task_board::board::{Board, BoardOptions};
use task_board::controller::{DrawOutcome, DrawState, EditResult};
use task_board::dialog::{DialogOutcome, ScriptedDialog};
use task_board::geometry::Point;
use task_board::persist::{FileSink, MemorySink, WritePolicy};
use task_board::render::{DrawCall, RecordingRenderer};
use task_board::store::ids::IdStyle;
use task_board::store::{Clock, StoreOptions};
use task_board::types::{Category, TaskFields};
use tempfile::TempDir;

type TestBoard = Board<MemorySink, RecordingRenderer>;

fn options() -> BoardOptions {
    BoardOptions {
        store: StoreOptions {
            id_style: IdStyle::Sequential,
            clock: Clock::Fixed(NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()),
            ..StoreOptions::default()
        },
        ..BoardOptions::default()
    }
}

/// Helper to create an empty board on a memory sink.
fn setup_board() -> TestBoard {
    Board::open(MemorySink::new(), options(), RecordingRenderer::new()).unwrap()
}

/// The last snapshot written, parsed.
fn saved(board: &TestBoard) -> Value {
    let bytes = board.persistence().sink().data().expect("nothing written");
    serde_json::from_slice(bytes).unwrap()
}

fn ids(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap())
        .collect()
}

mod end_to_end {
    use super::*;

    #[test]
    fn add_connect_remove() {
        let mut board = setup_board();

        let t1 = board.create_task(TaskFields::titled("Write outline")).unwrap();
        let t2 = board.create_task(TaskFields::titled("Review")).unwrap();
        assert_eq!(t1.as_str(), "t1");
        assert_eq!(t2.as_str(), "t2");

        let c1 = board.connect("t1", "t2").unwrap().unwrap();
        assert_eq!(c1.as_str(), "c1");

        let snapshot = saved(&board);
        assert_eq!(ids(&snapshot["tasks"]), vec!["t1", "t2"]);
        assert_eq!(ids(&snapshot["connections"]), vec!["c1"]);
        assert_eq!(snapshot["connections"][0]["from"], "t1");
        assert_eq!(snapshot["connections"][0]["to"], "t2");

        board.delete_node("t1").unwrap();

        let snapshot = saved(&board);
        assert_eq!(ids(&snapshot["tasks"]), vec!["t2"]);
        assert!(snapshot["connections"].as_array().unwrap().is_empty());
    }

    #[test]
    fn new_task_defaults() {
        let mut board = setup_board();
        board.create_task(TaskFields::titled("Write outline")).unwrap();

        let task = &saved(&board)["tasks"][0];
        assert_eq!(task["description"], "");
        assert_eq!(task["due_date"], "2026-03-14");
        assert_eq!(task["created_date"], "2026-03-14");
        assert_eq!(task["category"], "Work");
        assert_eq!(task["color"], "#ffc107");
        assert_eq!(task["pos"], serde_json::json!([20.0, 20.0]));
    }

    #[test]
    fn every_mutation_writes_once() {
        let mut board = setup_board();
        board.create_task(TaskFields::titled("A")).unwrap();
        board.create_task(TaskFields::titled("B")).unwrap();
        board.connect("t1", "t2").unwrap();
        board.move_node("t1", Point::new(50.0, 50.0)).unwrap();
        board.update_task("t2", TaskFields::default().with_category(Category::Urgent)).unwrap();
        board.delete_node("t1").unwrap();

        assert_eq!(board.persistence().sink().writes(), 6);
    }
}

mod gesture_tests {
    use super::*;

    fn setup_pair() -> TestBoard {
        let mut board = setup_board();
        board.create_task(TaskFields::titled("A")).unwrap();
        board.create_task(TaskFields::titled("B")).unwrap();
        board
    }

    #[test]
    fn same_node_twice_cancels() {
        let mut board = setup_pair();
        let writes = board.persistence().sink().writes();

        assert!(matches!(board.node_gesture("t1").unwrap(), DrawOutcome::Started(_)));
        assert!(matches!(board.node_gesture("t1").unwrap(), DrawOutcome::Cancelled(_)));

        assert_eq!(*board.draw_state(), DrawState::Idle);
        assert_eq!(board.store().connection_count(), 0);
        assert_eq!(board.persistence().sink().writes(), writes);
    }

    #[test]
    fn two_nodes_connect_once() {
        let mut board = setup_pair();

        board.node_gesture("t1").unwrap();
        board.node_gesture("t2").unwrap();
        board.node_gesture("t1").unwrap();
        board.node_gesture("t2").unwrap();

        assert_eq!(board.store().connection_count(), 1);
        assert_eq!(*board.draw_state(), DrawState::Idle);
        let connection = &board.store().connections()[0];
        assert_eq!(connection.from.as_str(), "t1");
        assert_eq!(connection.to.as_str(), "t2");
    }

    #[test]
    fn reverse_direction_is_distinct() {
        let mut board = setup_pair();

        board.node_gesture("t1").unwrap();
        board.node_gesture("t2").unwrap();
        board.node_gesture("t2").unwrap();
        board.node_gesture("t1").unwrap();

        assert_eq!(board.store().connection_count(), 2);
        assert!(board.store().find_connection("t2", "t1").is_some());
    }

    #[test]
    fn pending_source_is_drawn_marked() {
        let mut board = setup_pair();
        board.renderer_mut().take_calls();

        board.node_gesture("t1").unwrap();
        board.dismiss();

        let marks: Vec<bool> = board
            .renderer()
            .calls()
            .iter()
            .filter_map(|call| match call {
                DrawCall::Node { id, pending_source, .. } if id.as_str() == "t1" => {
                    Some(*pending_source)
                }
                _ => None,
            })
            .collect();
        assert_eq!(marks, vec![true, false]);
    }

    #[test]
    fn editor_dismisses_pending_draw() {
        let mut board = setup_pair();
        board.node_gesture("t1").unwrap();

        board.open_editor("t2", &mut ScriptedDialog::new([])).unwrap();

        assert_eq!(*board.draw_state(), DrawState::Idle);
        assert!(!board.scene().node("t1").unwrap().is_pending_source());
    }
}

mod move_tests {
    use super::*;

    #[test]
    fn move_updates_lines_and_persisted_pos() {
        let mut board = setup_board();
        board
            .create_task_at(TaskFields::titled("A"), Point::new(0.0, 0.0))
            .unwrap();
        board
            .create_task_at(TaskFields::titled("B"), Point::new(400.0, 0.0))
            .unwrap();
        board
            .create_task_at(TaskFields::titled("C"), Point::new(0.0, 400.0))
            .unwrap();
        let ab = board.connect("t1", "t2").unwrap().unwrap();
        let bc = board.connect("t2", "t3").unwrap().unwrap();
        board.renderer_mut().take_calls();

        board.move_node("t1", Point::new(100.0, 200.0)).unwrap();

        let line = board.scene().connection(ab.as_str()).unwrap().geometry();
        assert_eq!(line.start, Point::new(200.0, 240.0));
        assert_eq!(line.end, Point::new(500.0, 40.0));
        assert_eq!(board.renderer().last_line(ab.as_str()), Some(line));
        assert_eq!(board.renderer().last_line(bc.as_str()), None);

        let snapshot = saved(&board);
        assert_eq!(snapshot["tasks"][0]["pos"], serde_json::json!([100.0, 200.0]));
        assert_eq!(snapshot["tasks"][1]["pos"], serde_json::json!([400.0, 0.0]));
    }

    #[test]
    fn debounced_drag_writes_final_position() {
        let mut options = options();
        options.write_policy = WritePolicy::Debounced(Duration::from_millis(250));
        let mut board = Board::open(MemorySink::new(), options, RecordingRenderer::new()).unwrap();
        board.create_task(TaskFields::titled("A")).unwrap();
        assert_eq!(board.persistence().sink().writes(), 1);

        for step in 1..=10 {
            board
                .move_node("t1", Point::new(step as f64 * 10.0, 0.0))
                .unwrap();
        }
        assert_eq!(board.persistence().sink().writes(), 1);
        assert!(board.persistence().is_dirty());

        assert!(board.tick(Instant::now() + Duration::from_secs(1)));
        assert_eq!(board.persistence().sink().writes(), 2);
        assert_eq!(saved(&board)["tasks"][0]["pos"], serde_json::json!([100.0, 0.0]));
    }

    #[test]
    fn move_unknown_node_fails_without_write() {
        let mut board = setup_board();
        assert!(board.move_node("nope", Point::new(1.0, 1.0)).is_err());
        assert_eq!(board.persistence().sink().writes(), 0);
    }
}

mod editor_tests {
    use super::*;

    #[test]
    fn save_merges_fields() {
        let mut board = setup_board();
        board
            .create_task(TaskFields::titled("Draft").with_description("first pass"))
            .unwrap();

        let mut dialog = ScriptedDialog::saving(
            TaskFields::titled("Final").with_category(Category::Study),
        );
        let result = board.open_editor("t1", &mut dialog).unwrap();

        assert_eq!(result, EditResult::Updated);
        let task = board.store().task("t1").unwrap();
        assert_eq!(task.title, "Final");
        assert_eq!(task.description, "first pass");
        assert_eq!(task.category, Category::Study);
        assert_eq!(dialog.seen()[0].as_ref().unwrap().title.as_deref(), Some("Draft"));
        assert_eq!(saved(&board)["tasks"][0]["title"], "Final");
    }

    #[test]
    fn cancel_changes_nothing() {
        let mut board = setup_board();
        board.create_task(TaskFields::titled("Draft")).unwrap();
        let writes = board.persistence().sink().writes();

        let result = board
            .open_editor("t1", &mut ScriptedDialog::new([DialogOutcome::Cancelled]))
            .unwrap();

        assert_eq!(result, EditResult::Unchanged);
        assert_eq!(board.persistence().sink().writes(), writes);
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut board = setup_board();
        board.create_task(TaskFields::titled("Draft")).unwrap();

        let mut dialog = ScriptedDialog::saving(TaskFields::titled("   "));
        assert!(board.open_editor("t1", &mut dialog).is_err());
        assert_eq!(board.store().task("t1").unwrap().title, "Draft");
    }

    #[test]
    fn create_via_dialog() {
        let mut board = setup_board();

        let mut dialog = ScriptedDialog::new([
            DialogOutcome::Deleted,
            DialogOutcome::Cancelled,
            DialogOutcome::Saved(TaskFields::titled("From dialog")),
        ]);
        assert_eq!(board.create_task_via_dialog(&mut dialog).unwrap(), None);
        assert_eq!(board.create_task_via_dialog(&mut dialog).unwrap(), None);
        let id = board.create_task_via_dialog(&mut dialog).unwrap().unwrap();

        assert_eq!(board.store().task_count(), 1);
        assert_eq!(board.store().task(id.as_str()).unwrap().title, "From dialog");
        assert!(dialog.seen().iter().all(Option::is_none));
    }

    #[test]
    fn delete_from_editor_cascades_and_clears_renderer() {
        let mut board = setup_board();
        board.create_task(TaskFields::titled("A")).unwrap();
        board.create_task(TaskFields::titled("B")).unwrap();
        board.create_task(TaskFields::titled("C")).unwrap();
        board.connect("t1", "t2").unwrap();
        board.connect("t3", "t1").unwrap();
        board.connect("t2", "t3").unwrap();
        board.renderer_mut().take_calls();

        board.open_editor("t1", &mut ScriptedDialog::deleting()).unwrap();

        assert_eq!(board.store().connection_count(), 1);
        assert_eq!(board.scene().connection_count(), 1);
        assert_eq!(board.scene().node("t2").unwrap().connections().len(), 1);
        let calls = board.renderer().calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls.last(), Some(DrawCall::RemoveNode(id)) if id.as_str() == "t1"));
    }
}

mod persistence_tests {
    use super::*;

    #[test]
    fn failed_write_keeps_memory_state() {
        let mut board =
            Board::open(MemorySink::failing(), options(), RecordingRenderer::new()).unwrap();

        board.create_task(TaskFields::titled("A")).unwrap();
        board.create_task(TaskFields::titled("B")).unwrap();

        assert_eq!(board.store().task_count(), 2);
        assert_eq!(board.persistence().failed_writes(), 2);
        assert!(board.persistence().is_dirty());
    }

    #[test]
    fn reopen_from_file_continues_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");

        let mut board = Board::open(FileSink::new(&path), options(), RecordingRenderer::new()).unwrap();
        board.create_task(TaskFields::titled("A")).unwrap();
        board.create_task(TaskFields::titled("B")).unwrap();
        board.connect("t1", "t2").unwrap();
        board.close();

        let mut board = Board::open(FileSink::new(&path), options(), RecordingRenderer::new()).unwrap();
        assert_eq!(board.store().task_count(), 2);
        assert_eq!(board.scene().connection_count(), 1);
        assert_eq!(board.renderer().calls().len(), 3);

        let id = board.create_task(TaskFields::titled("C")).unwrap();
        assert_eq!(id.as_str(), "t3");
        assert_eq!(board.connect("t1", "t2").unwrap(), None);
    }

    #[test]
    fn dropping_debounced_board_writes_pending_move() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        let mut debounced = options();
        debounced.write_policy = WritePolicy::Debounced(Duration::from_secs(60));

        {
            let mut board =
                Board::open(FileSink::new(&path), debounced, RecordingRenderer::new()).unwrap();
            board.create_task(TaskFields::titled("A")).unwrap();
            board.move_node("t1", Point::new(500.0, 500.0)).unwrap();
            assert!(board.persistence().is_dirty());
        }

        let board = Board::open(FileSink::new(&path), options(), RecordingRenderer::new()).unwrap();
        assert_eq!(board.store().task("t1").unwrap().pos, Point::new(500.0, 500.0));
    }

    #[test]
    fn gzip_snapshot_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json.gz");

        let mut board = Board::open(FileSink::new(&path), options(), RecordingRenderer::new()).unwrap();
        board.create_task(TaskFields::titled("Compressed")).unwrap();
        board.close();

        let raw = std::fs::read(&path).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);

        let board = Board::open(FileSink::new(&path), options(), RecordingRenderer::new()).unwrap();
        assert_eq!(board.store().task("t1").unwrap().title, "Compressed");
    }
}
