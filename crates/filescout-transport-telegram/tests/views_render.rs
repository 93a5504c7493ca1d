//! Rendering of result pages into Telegram HTML and inline keyboards.

use filescout_core::catalog::{CatalogAggregator, FileRecord, InMemoryCatalog};
use filescout_core::service::PageView;
use filescout_core::session::{SessionKey, SessionStore};
use filescout_core::source::{Source, SourceSelector};
use filescout_core::validator::SearchCandidate;
use filescout_core::SearchService;
use filescout_transport_telegram::bot::views::{render_results, results_keyboard, DeepLinks};
use lazy_regex::regex;
use std::sync::Arc;
use std::time::Duration;
use teloxide::types::{InlineKeyboardButtonKind, InlineKeyboardMarkup};

fn record(id: &str, name: &str, size: u64, source: Source) -> FileRecord {
    FileRecord {
        id: id.to_string(),
        name: name.to_string(),
        size,
        source,
    }
}

async fn first_page(records: Vec<FileRecord>, query: &str, page_size: usize) -> PageView {
    let aggregator = CatalogAggregator::new(
        Arc::new(InMemoryCatalog::from_records(records)),
        Source::ALL.to_vec(),
        Duration::from_secs(5),
    );
    let service = SearchService::new(aggregator, Arc::new(SessionStore::new(10)), page_size);
    service
        .start_search(
            &SearchCandidate::text(query),
            77,
            SessionKey::new(-1001, 9),
            SourceSelector::All,
        )
        .await
        .expect("search should find records")
}

fn callbacks(markup: &InlineKeyboardMarkup) -> Vec<Vec<(String, String)>> {
    markup
        .inline_keyboard
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| match &button.kind {
                    InlineKeyboardButtonKind::CallbackData(data) => {
                        (button.text.clone(), data.clone())
                    }
                    other => panic!("unexpected button kind {other:?}"),
                })
                .collect()
        })
        .collect()
}

#[tokio::test]
async fn caption_lists_records_with_deep_links() {
    let view = first_page(
        vec![
            record("a1", "Batman.Begins.2005.mkv", 1_572_864, Source::Primary),
            record("a2", "Batman.Returns.1992.mkv", 512, Source::Primary),
        ],
        "batman",
        10,
    )
    .await;

    let html = render_results(&view, &DeepLinks::new("scout_bot"));

    assert!(html.contains("👑 Search: batman"));
    assert!(html.contains("🎬 Total: 2"));
    assert!(html.contains("📚 Source: PRIMARY"));
    assert!(html.contains("📄 Page: 1/1"));
    assert!(html.contains("[1.50 MB] Batman.Begins.2005.mkv"));

    let link = regex!(r#"href="https://t\.me/scout_bot\?start=file_(-?\d+)_(\w+)""#);
    let found: Vec<(String, String)> = link
        .captures_iter(&html)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("-1001".to_string(), "a1".to_string()),
            ("-1001".to_string(), "a2".to_string())
        ]
    );
}

#[tokio::test]
async fn caption_escapes_html_in_names_and_query() {
    let view = first_page(
        vec![record("x", "<b>Tom & Jerry</b>.avi", 10, Source::Cloud)],
        "tom jerry",
        10,
    )
    .await;

    let html = render_results(&view, &DeepLinks::new("@scout_bot"));

    assert!(html.contains("&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;.avi"));
    assert!(html.contains("📚 Source: CLOUD"));
    assert!(html.contains("https://t.me/scout_bot?start="));
}

#[tokio::test]
async fn first_page_keyboard_has_no_prev_button() {
    let records: Vec<FileRecord> = (0..5)
        .map(|i| record(&format!("p{i}"), &format!("Dune part {i}.mkv"), 1, Source::Primary))
        .collect();
    let view = first_page(records, "dune", 2).await;

    let rows = callbacks(&results_keyboard(&view));

    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0],
        vec![
            ("📄 1/3".to_string(), "pages".to_string()),
            ("Next »".to_string(), "nav:77:-1001_9:2:primary".to_string()),
        ]
    );
    assert_eq!(
        rows[1],
        vec![
            ("✅ Primary".to_string(), "switch:77:-1001_9:primary".to_string()),
            ("📂 Cloud".to_string(), "switch:77:-1001_9:cloud".to_string()),
            ("📂 Archive".to_string(), "switch:77:-1001_9:archive".to_string()),
        ]
    );
    assert_eq!(rows[2], vec![("❌ Close".to_string(), "close".to_string())]);
}

#[tokio::test]
async fn every_callback_fits_telegram_limit() {
    let view = first_page(
        vec![record("z", "Zodiac.mkv", 1, Source::Archive)],
        "zodiac",
        1,
    )
    .await;

    for row in callbacks(&results_keyboard(&view)) {
        for (_, data) in row {
            assert!(data.len() <= 64, "{data} is too long");
        }
    }
}
