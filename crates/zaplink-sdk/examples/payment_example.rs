/*
[INPUT]:  An authenticated session persisted by the login example
[OUTPUT]: Payment URL and recent transaction history
[POS]:    Examples - payment and history demonstration
[UPDATE]: When payment or transaction endpoints change
*/

use std::env;

use rust_decimal::Decimal;
use zaplink_sdk::*;

/// Example: Payments and transaction history
///
/// Requires a persisted session (run the login_flow example first).
#[tokio::main]
async fn main() {
    let config = ZaplinkConfig::new(
        env::var("ZAPLINK_API_KEY").unwrap_or_default(),
        env::var("ZAPLINK_SECRET_KEY").unwrap_or_default(),
        env::var("ZAPLINK_APP_ID").unwrap_or_default(),
    );

    let client = match Zaplink::with_storage(config, Box::new(FileStorage::new("./.zaplink-session"))) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };

    if !client.is_authenticated() {
        eprintln!("No valid session; run the login_flow example first");
        return;
    }

    let _on_created = client.on(ZaplinkEvent::PaymentCreated, |data| {
        if let EventData::Payment(payment) = data {
            println!("  payment created: {:?}", payment.payment_id);
        }
    });

    match client.make_payment(Decimal::ONE, Some("Example payment")).await {
        Ok(response) => {
            println!("✓ Payment created");
            println!("  Complete it at: {}", response.payment_url.unwrap_or_default());
        }
        Err(e) => eprintln!("Payment failed: {}", e),
    }

    let filters = TransactionFilters {
        status: Some(TransactionStatus::Completed),
        page: Some(1),
        per_page: Some(10),
    };
    match client.get_transactions(Some(filters)).await {
        Ok(history) => {
            let count = history.transactions.map(|t| t.len()).unwrap_or(0);
            println!("✓ Fetched {count} completed transactions");
        }
        Err(e) => eprintln!("Failed to fetch transactions: {}", e),
    }
}
