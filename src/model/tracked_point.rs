#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct TrackedPoint {
    pub id: i64,
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
}
