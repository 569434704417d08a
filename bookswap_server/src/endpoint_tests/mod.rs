mod auth;
mod cards;
mod helpers;
mod item_lists;
mod listings;
mod mocks;
mod orders;
