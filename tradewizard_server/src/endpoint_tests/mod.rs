mod auth;
mod helpers;
mod mocks;
mod payments;
mod robots;
