pub mod record_codec;
