mod helpers;

mod callback;
mod orders;
