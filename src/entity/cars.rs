use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cars")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub mileage: Option<i32>,
    #[sea_orm(column_type = "Double", nullable)]
    pub price: Option<f64>,
    pub color: Option<String>,
    pub vin: Option<String>,
    #[sea_orm(column_type = "Double", nullable)]
    pub average_yearly_maintenance_cost: Option<f64>,
    pub description: Option<String>,
    pub year: Option<i32>,
    pub is_new: Option<bool>,
    pub cover_image_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pictures::Entity")]
    Pictures,
    #[sea_orm(has_many = "super::favorites::Entity")]
    Favorites,
}

impl Related<super::pictures::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pictures.def()
    }
}

impl Related<super::favorites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
