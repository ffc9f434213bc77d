//! Live implementations of the engine's collaborator traits: Duitku (payment gateway), Digiflazz (provisioning
//! provider) and WhatsApp (notifier).
pub mod digiflazz;
pub mod duitku;
pub mod whatsapp;

pub use digiflazz::DigiflazzClient;
pub use duitku::DuitkuClient;
pub use whatsapp::WhatsAppNotifier;
