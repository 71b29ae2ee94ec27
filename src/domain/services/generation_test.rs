use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::BatchGenerator;
use super::GenerationError;
use super::GenerationSettings;
use crate::domain::models::GenerationEvent;
use crate::domain::models::ImageServiceError;
use crate::domain::services::fake_image_service::image_for;
use crate::domain::services::fake_image_service::FakeImageService;
use crate::domain::services::fake_image_service::BACK_PROMPT;
use crate::domain::services::fake_image_service::FRONT_PROMPT;

fn settings(delay: Duration) -> GenerationSettings {
    return GenerationSettings {
        back_prompt: BACK_PROMPT.to_string(),
        front_prompt: FRONT_PROMPT.to_string(),
        request_delay: delay,
    };
}

fn labels(items: &[&str]) -> Vec<String> {
    return items.iter().map(|item| return item.to_string()).collect();
}

fn drain(rx: &mut mpsc::UnboundedReceiver<GenerationEvent>) -> Vec<String> {
    let mut events = vec![];
    while let Ok(event) = rx.try_recv() {
        let desc = match event {
            GenerationEvent::BackImageReady(_) => "back".to_string(),
            GenerationEvent::CardGenerated(card) => format!("card {}", card.label()),
            GenerationEvent::LabelFailed { label, .. } => format!("failed {label}"),
            GenerationEvent::Finished { cancelled } => format!("finished cancelled={cancelled}"),
        };
        events.push(desc);
    }

    return events;
}

#[tokio::test]
async fn it_generates_every_label_in_order() -> Result<()> {
    let fake = Arc::new(FakeImageService::default());
    let generator = BatchGenerator::new(fake.clone(), settings(Duration::ZERO));
    let (tx, mut rx) = mpsc::unbounded_channel::<GenerationEvent>();

    let outcome = generator
        .run(
            &labels(&["Anger", "Joy", "Sorrow"]),
            &CancellationToken::new(),
            &tx,
        )
        .await?;

    let generated = outcome
        .records
        .iter()
        .map(|card| return card.label())
        .collect::<Vec<&str>>();
    assert_eq!(generated, vec!["Anger", "Joy", "Sorrow"]);
    assert_eq!(outcome.back_image, image_for(BACK_PROMPT));
    assert_eq!(outcome.records[1].original_image(), &image_for("front Joy"));
    assert!(outcome.errors.is_empty());
    assert!(!outcome.cancelled);

    assert_eq!(
        fake.prompts(),
        vec!["back", "front Anger", "front Joy", "front Sorrow"]
    );
    assert_eq!(
        drain(&mut rx),
        vec![
            "back",
            "card Anger",
            "card Joy",
            "card Sorrow",
            "finished cancelled=false"
        ]
    );

    return Ok(());
}

#[tokio::test]
async fn it_handles_an_empty_label_list() -> Result<()> {
    let fake = Arc::new(FakeImageService::default());
    let generator = BatchGenerator::new(fake.clone(), settings(Duration::ZERO));
    let (tx, _rx) = mpsc::unbounded_channel::<GenerationEvent>();

    let outcome = generator.run(&[], &CancellationToken::new(), &tx).await?;

    assert!(outcome.records.is_empty());
    assert_eq!(fake.prompts(), vec!["back"]);
    return Ok(());
}

#[tokio::test]
async fn it_aborts_when_the_back_image_fails() -> Result<()> {
    let fake = Arc::new(FakeImageService {
        fail_back: true,
        ..Default::default()
    });
    let generator = BatchGenerator::new(fake.clone(), settings(Duration::ZERO));
    let (tx, mut rx) = mpsc::unbounded_channel::<GenerationEvent>();

    let res = generator
        .run(&labels(&["Anger", "Joy"]), &CancellationToken::new(), &tx)
        .await;

    match res {
        Err(GenerationError::BackImage(ImageServiceError::Blocked { reason })) => {
            assert_eq!(reason, "SAFETY");
        }
        _ => bail!("Expected a fatal back image error"),
    }
    assert_eq!(fake.prompts(), vec!["back"]);
    assert!(drain(&mut rx).is_empty());

    return Ok(());
}

#[tokio::test]
async fn it_fails_setup_without_configuration() -> Result<()> {
    let fake = Arc::new(FakeImageService {
        unconfigured: true,
        ..Default::default()
    });
    let generator = BatchGenerator::new(fake.clone(), settings(Duration::ZERO));
    let (tx, _rx) = mpsc::unbounded_channel::<GenerationEvent>();

    let res = generator
        .run(&labels(&["Anger"]), &CancellationToken::new(), &tx)
        .await;

    assert!(matches!(res, Err(GenerationError::Setup(_))));
    assert!(fake.prompts().is_empty());
    return Ok(());
}

#[tokio::test]
async fn it_skips_failed_labels_and_continues() -> Result<()> {
    let fake = Arc::new(FakeImageService {
        failing_labels: vec!["Joy".to_string()],
        ..Default::default()
    });
    let generator = BatchGenerator::new(fake.clone(), settings(Duration::ZERO));
    let (tx, mut rx) = mpsc::unbounded_channel::<GenerationEvent>();

    let outcome = generator
        .run(
            &labels(&["Anger", "Joy", "Sorrow"]),
            &CancellationToken::new(),
            &tx,
        )
        .await?;

    let generated = outcome
        .records
        .iter()
        .map(|card| return card.label())
        .collect::<Vec<&str>>();
    assert_eq!(generated, vec!["Anger", "Sorrow"]);

    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].label, "Joy");
    assert!(matches!(
        outcome.errors[0].source,
        ImageServiceError::NoImage { .. }
    ));

    assert_eq!(
        drain(&mut rx),
        vec![
            "back",
            "card Anger",
            "failed Joy",
            "card Sorrow",
            "finished cancelled=false"
        ]
    );

    return Ok(());
}

#[tokio::test]
async fn it_stops_before_any_front_request_when_cancelled() -> Result<()> {
    let fake = Arc::new(FakeImageService::default());
    let generator = BatchGenerator::new(fake.clone(), settings(Duration::ZERO));
    let (tx, mut rx) = mpsc::unbounded_channel::<GenerationEvent>();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = generator
        .run(&labels(&["Anger", "Joy"]), &cancel, &tx)
        .await?;

    assert!(outcome.records.is_empty());
    assert!(outcome.cancelled);
    assert_eq!(fake.prompts(), vec!["back"]);
    assert_eq!(drain(&mut rx), vec!["back", "finished cancelled=true"]);

    return Ok(());
}

#[tokio::test]
async fn it_discards_results_arriving_after_cancellation() -> Result<()> {
    let cancel = CancellationToken::new();
    // Call 1 is the back, calls 2 and 3 the first two fronts.
    let fake = Arc::new(FakeImageService {
        cancel_during_call: Some((4, cancel.clone())),
        ..Default::default()
    });
    let generator = BatchGenerator::new(fake.clone(), settings(Duration::ZERO));
    let (tx, mut rx) = mpsc::unbounded_channel::<GenerationEvent>();

    let outcome = generator
        .run(&labels(&["Anger", "Joy", "Sorrow", "Fear"]), &cancel, &tx)
        .await?;

    let generated = outcome
        .records
        .iter()
        .map(|card| return card.label())
        .collect::<Vec<&str>>();
    assert_eq!(generated, vec!["Anger", "Joy"]);
    assert!(outcome.cancelled);
    assert_eq!(
        fake.prompts(),
        vec!["back", "front Anger", "front Joy", "front Sorrow"]
    );
    assert_eq!(
        drain(&mut rx),
        vec!["back", "card Anger", "card Joy", "finished cancelled=true"]
    );

    return Ok(());
}

#[tokio::test(start_paused = true)]
async fn it_stops_when_an_observer_cancels_during_the_delay() -> Result<()> {
    let fake = Arc::new(FakeImageService::default());
    let generator = BatchGenerator::new(fake.clone(), settings(Duration::from_secs(5)));
    let (tx, mut rx) = mpsc::unbounded_channel::<GenerationEvent>();
    let cancel = CancellationToken::new();

    let worker_cancel = cancel.clone();
    let worker = tokio::spawn(async move {
        return generator
            .run(
                &labels(&["Anger", "Joy", "Sorrow"]),
                &worker_cancel,
                &tx,
            )
            .await;
    });

    while let Some(event) = rx.recv().await {
        if let GenerationEvent::CardGenerated(_) = event {
            cancel.cancel();
        }
    }

    let outcome = worker.await??;
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].label(), "Anger");
    assert!(outcome.cancelled);
    assert_eq!(fake.prompts(), vec!["back", "front Anger"]);

    return Ok(());
}

#[tokio::test(start_paused = true)]
async fn it_waits_between_every_front_request() -> Result<()> {
    let delay = Duration::from_secs(5);
    let fake = Arc::new(FakeImageService::default());
    let generator = BatchGenerator::new(fake.clone(), settings(delay));
    let (tx, _rx) = mpsc::unbounded_channel::<GenerationEvent>();

    generator
        .run(
            &labels(&["Anger", "Joy", "Sorrow"]),
            &CancellationToken::new(),
            &tx,
        )
        .await?;

    let times = fake.call_times();
    assert_eq!(times.len(), 4);
    for pair in times.windows(2) {
        assert!(pair[1].duration_since(pair[0]) >= delay);
    }

    return Ok(());
}

#[tokio::test]
async fn it_fails_when_the_observer_is_gone() -> Result<()> {
    let fake = Arc::new(FakeImageService::default());
    let generator = BatchGenerator::new(fake.clone(), settings(Duration::ZERO));
    let (tx, rx) = mpsc::unbounded_channel::<GenerationEvent>();
    drop(rx);

    let res = generator
        .run(&labels(&["Anger"]), &CancellationToken::new(), &tx)
        .await;

    assert!(matches!(res, Err(GenerationError::ObserverClosed)));
    return Ok(());
}
