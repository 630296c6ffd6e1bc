//! Campus Marketplace
//! Mission: Item listings, lost & found posts, and direct messages between students

pub mod models;
pub mod store;

pub use models::{
    Created, InboxMessage, Item, ItemDetail, ItemFilter, ItemListing, LostFoundFilter,
    LostFoundListing, NewItem, NewLostFound, NewMessage, PostKind,
};
pub use store::MarketStore;
