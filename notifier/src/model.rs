/// Everything a rendered alert needs about one confirmed deal.
#[derive(Debug, Clone, PartialEq)]
pub struct DealNotification {
    pub item_name: String,
    pub old_price: f64,
    pub new_price: f64,
    /// Whole percent, already rounded for display.
    pub discount_rate: i64,
    pub rationale: String,
    pub image_url: Option<String>,
    pub link: Option<String>,
}

/// Who the message is addressed to. Only changes the header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Operator channel receiving every confirmed deal.
    Broadcast,
    /// A user who follows the item.
    Subscriber,
}
