pub mod ai;
pub mod market;
pub mod sync;
pub mod weather;

pub use ai::{
    ChatMessage, ChatRequest, ChatResponse, ChemicalTreatment, DiagnosisResult, GenerationRequest,
    GenerationResponse, ImageAnalysisRequest, OrganicTreatment, Severity, TokenUsage, Treatment,
};
pub use market::{MarketPriceEntry, MarketPriceList, PriceTrend, TradeRecommendation};
pub use sync::{SyncRecord, SyncRequest, SyncResult};
pub use weather::{
    CurrentConditions, DailyForecast, FarmingAdvice, IrrigationAdvice, SprayAdvice, WeatherReport,
};
