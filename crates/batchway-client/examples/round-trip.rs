// ABOUTME: Uploads a small batch, lists the service, and fetches the batch back
// ABOUTME: Run with: cargo run --example round-trip -- <host:port>

use std::sync::Arc;

use arrow_array::{ArrayRef, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use batchway_client::{CallContext, ClientConfig, Connection};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    batchway_log::init_for("batchway_client");

    let address = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "localhost:8080".to_string());

    let conn = Connection::connect(ClientConfig::new(address)).await?;
    let ctx = CallContext::background();

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("city", DataType::Utf8, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![1, 2, 3])),
        Arc::new(StringArray::from(vec!["Oslo", "Lima", "Pune"])),
    ];
    let batch = RecordBatch::try_new(schema, columns)?;

    let id = conn.put(&ctx, &batch).await?;
    println!("stored batch {}", id);

    let ids = conn.list(&ctx).await?;
    println!("service holds {} batches", ids.len());

    let fetched = conn.get(&ctx, &id).await?;
    println!(
        "fetched {} rows x {} columns, identical: {}",
        fetched.num_rows(),
        fetched.num_columns(),
        fetched == batch
    );

    conn.close().await?;
    Ok(())
}
