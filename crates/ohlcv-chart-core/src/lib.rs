pub mod annotation;
pub mod buckets;
pub mod candle;
pub mod chart;
pub mod error;
pub mod figure;
pub mod html;
pub mod interval;
pub mod locale;
pub mod marker;
pub mod output;
pub mod range;
