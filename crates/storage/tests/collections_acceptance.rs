use chrono::Utc;
use shared::{
    domain::Collection,
    form::FormData,
    records::{WaitlistRecord, WishlistRecord},
};
use storage::{append_record, DocumentStore, PersistenceClient};

#[tokio::test]
async fn signup_documents_survive_reopening_the_store() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("data").join("landing.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    {
        let store = DocumentStore::new(&database_url).await.expect("db");
        let client: &dyn PersistenceClient = &store;

        append_record(
            client,
            Collection::Waitlist,
            &WaitlistRecord::new("a@b.co", Utc::now()),
        )
        .await
        .expect("waitlist append");

        let form = FormData::new()
            .with("email", "a@b.co")
            .with("storage", "2TB")
            .with("battery", "Large")
            .with("purpose", "Video Server")
            .with("purpose", "Web Hosting");
        append_record(
            client,
            Collection::Wishlist,
            &WishlistRecord::from_form(&form, Utc::now()),
        )
        .await
        .expect("wishlist append");
    }

    let reopened = DocumentStore::new(&database_url).await.expect("reopen");
    let waitlist = reopened.documents(Collection::Waitlist).await.expect("list");
    let wishlist = reopened.documents(Collection::Wishlist).await.expect("list");

    assert_eq!(waitlist.len(), 1);
    assert_eq!(waitlist[0].body["email"], "a@b.co");

    assert_eq!(wishlist.len(), 1);
    let survey = &wishlist[0].body;
    assert_eq!(survey["purpose_video_server"], true);
    assert_eq!(survey["purpose_web_hosting"], true);
    assert_eq!(survey["purpose_normal_storage"], false);
    assert_eq!(survey["storage"], "2TB");
    assert_eq!(survey["battery"], "Large");
}
