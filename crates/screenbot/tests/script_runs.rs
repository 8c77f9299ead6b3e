use screenbot::{
    run_repeated, BoundingBox, ExecutionEngine, ObjectMatch, ProviderError, RetryPolicy,
    ScreenProvider, Script, TextMatch,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A dialog that shows "OK" until it has been clicked twice
#[derive(Default)]
struct Dialog {
    clicks: Mutex<Vec<(i32, i32)>>,
    typed: Mutex<String>,
}

#[async_trait::async_trait]
impl ScreenProvider for Dialog {
    async fn locate_text(&self, query: &str) -> Result<Vec<TextMatch>, ProviderError> {
        let open = self.clicks.lock().unwrap().len() < 2;
        if open && "ok".contains(&query.to_lowercase()) {
            return Ok(vec![TextMatch {
                x: 640,
                y: 480,
                bounding_box: BoundingBox::new(620, 470, 660, 490),
                text: "OK".to_string(),
                confidence: 0.97,
            }]);
        }
        Ok(Vec::new())
    }

    async fn locate_objects(
        &self,
        _class_query: Option<&str>,
    ) -> Result<Vec<ObjectMatch>, ProviderError> {
        Ok(Vec::new())
    }

    async fn click(&self, x: i32, y: i32) -> Result<(), ProviderError> {
        self.clicks.lock().unwrap().push((x, y));
        Ok(())
    }

    async fn move_to(&self, _x: i32, _y: i32) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<(), ProviderError> {
        self.typed.lock().unwrap().push_str(text);
        Ok(())
    }

    async fn press_key(&self, _key: &str) -> Result<(), ProviderError> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_jump_to_directive_line_falls_through() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("dismiss.txt");
    std::fs::write(
        &path,
        "type hi\n\nclick text ok\n# LOOP_IF_SUCCESS 3\ntype done\n",
    )
    .unwrap();

    let script = Script::from_file(&path).unwrap();
    assert_eq!(script.warnings.len(), 1);

    let dialog = Arc::new(Dialog::default());
    let engine = ExecutionEngine::new(dialog.clone())
        .with_policy(RetryPolicy::new(2, Duration::from_millis(100)));
    let summary = engine.run(&script.instructions).await.unwrap();

    // line numbers skip the blank line: type=1, click=2
    assert_eq!(script.instructions[1].line_number, 2);
    // LOOP_IF_SUCCESS 3 names the directive line, so no jump happens
    assert_eq!(summary.jumps_taken, 0);
    assert_eq!(dialog.clicks.lock().unwrap().len(), 1);
    assert_eq!(*dialog.typed.lock().unwrap(), "hidone");
}

#[tokio::test(start_paused = true)]
async fn test_loop_on_command_line() {
    let script = Script::parse("click text ok\n# LOOP_IF_SUCCESS 1\ntype closed");
    let dialog = Arc::new(Dialog::default());
    let engine = ExecutionEngine::new(dialog.clone())
        .with_policy(RetryPolicy::new(2, Duration::from_millis(100)));

    let outcome = run_repeated(&engine, &script.instructions, 1, Duration::ZERO)
        .await
        .unwrap();
    let summary = &outcome.iterations[0];

    // two successful clicks loop back, the third visit finds nothing
    assert_eq!(dialog.clicks.lock().unwrap().len(), 2);
    assert_eq!(summary.jumps_taken, 2);
    assert_eq!(summary.attempted_count, 4);
    assert_eq!(summary.succeeded_count, 3);
    assert_eq!(*dialog.typed.lock().unwrap(), "closed");
}
