pub mod quit_confirmation;
