//! Prompt texts sent to the model for each kind of generated field.

use crate::listing::Listing;

pub fn rating_prompt(listing: &Listing) -> String {
    format!(
        "Assign a rating out of 5 stars (use one decimal place) for this property based on the following details:\n\
         {}\
         Please provide the rating in decimal format.",
        details(listing)
    )
}

pub fn review_prompt(listing: &Listing) -> String {
    format!(
        "Generate a detailed review for the following property:\n\
         {}\
         Please provide a comprehensive review describing the property's features, amenities, and overall experience.",
        details(listing)
    )
}

pub fn summary_prompt(listing: &Listing) -> String {
    format!(
        "Generate a summary for the following property: Title: {}, Description: {}, Location: {}, Price: {}, Room Type: {}",
        listing.title, listing.description, listing.location, listing.price, listing.room_type
    )
}

pub fn rewrite_prompt(title: &str, description: &str) -> String {
    format!("Rewrite the following: Title: {}, Description: {}", title, description)
}

/// One field per line, the layout used by the rating and review prompts
fn details(listing: &Listing) -> String {
    format!(
        "Title: {},\nDescription: {},\nLocation: {},\nRoom Type: {},\nPrice: {}\n",
        listing.title, listing.description, listing.location, listing.room_type, listing.price
    )
}
