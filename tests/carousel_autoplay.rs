use std::time::Duration;

use serde_json::json;
use vitrine::carousel::{AutoplayConfig, MountedCarousel, decode_ad_images};
use vitrine_api_types::AdLayout;

const CONFIG: AutoplayConfig = AutoplayConfig {
    interval: Duration::from_millis(1_000),
    transition: Duration::from_millis(200),
};

async fn settle() {
    for _ in 0..3 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn autoplay_wraps_from_last_page_back_to_first() {
    let raw = decode_ad_images(&[
        json!({"id": "a", "imageUrl": "https://cdn/a.png"}),
        json!({"id": "b", "imageUrl": "http://cdn/b.png"}),
        json!({"id": "c", "imageUrl": "https://cdn/c.png"}),
        json!({"id": "d", "imageUrl": ""}),
    ]);
    let mounted = MountedCarousel::mount(&raw, AdLayout::Double, CONFIG);

    assert!(mounted.is_autoplaying());
    assert_eq!(mounted.with(|c| c.page_count()), 2);
    assert_eq!(mounted.with(|c| c.current_display_index()), 1);

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    settle().await;
    assert_eq!(mounted.with(|c| c.current_display_index()), 2);

    // Second tick lands on the trailing clone, then snaps to the real first page.
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    settle().await;
    assert_eq!(mounted.with(|c| c.index()), 3);
    tokio::time::sleep(Duration::from_millis(200)).await;
    settle().await;
    let frame = mounted.with(|c| c.frame());
    assert_eq!(frame.index, 1);
    assert!(!frame.animate);
    assert_eq!(mounted.with(|c| c.current_display_index()), 1);
}

#[tokio::test(start_paused = true)]
async fn user_swipe_and_unmount() {
    let raw = decode_ad_images(&[
        json!({"imageUrl": "https://cdn/a.png"}),
        json!({"imageUrl": "https://cdn/b.png"}),
    ]);
    let mounted = MountedCarousel::mount(&raw, AdLayout::Single, CONFIG);
    let shared = mounted.carousel();

    // A short drag is ignored; a long one to the right goes back a page.
    assert!(mounted.with(|c| c.swipe_end(20.0)).is_none());
    assert!(mounted.with(|c| c.swipe_end(80.0)).is_some());
    assert_eq!(mounted.with(|c| c.index()), 0);
    mounted.with(|c| c.complete_transition());
    assert_eq!(mounted.with(|c| c.index()), 2);

    drop(mounted);
    let before = shared.lock().expect("carousel lock").index();
    tokio::time::sleep(Duration::from_millis(5_000)).await;
    settle().await;
    assert_eq!(shared.lock().expect("carousel lock").index(), before);
}

#[tokio::test]
async fn single_image_never_autoplays() {
    let raw = decode_ad_images(&[json!({"imageUrl": "https://cdn/only.png"})]);
    let mounted = MountedCarousel::mount(&raw, AdLayout::Triple, CONFIG);
    assert!(!mounted.is_autoplaying());
    assert_eq!(mounted.with(|c| c.page_count()), 1);
}
