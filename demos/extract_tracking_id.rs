//! Extract a tracking/reference ID from a submission success page.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example extract_tracking_id
//! ```

use otp_sync::tracking::{extract_all_ids, extract_tracking_id, validate_tracking_id};

fn main() {
    let success_page = "Your complaint has been successfully registered. \
                        Reference ID: GRV2024/001234. \
                        An acknowledgement SMS has been sent to your mobile.";

    match extract_tracking_id(success_page, None) {
        Some(id) => {
            println!("Tracking ID: {id}");
            println!("Valid shape: {}", validate_tracking_id(&id));
        }
        None => println!("No tracking ID found"),
    }

    println!("All candidates: {:?}", extract_all_ids(success_page));

    // An error page never yields an ID, even with a label-shaped candidate
    let error_page = "Something went wrong. Error ID: ERR-90210";
    assert_eq!(extract_tracking_id(error_page, None), None);
    println!("Error page correctly yielded no ID");
}
