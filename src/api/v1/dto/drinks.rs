/*
 * Responsibility
 * - Drinks の request/response DTO
 * - recipe は保存時 JSON 文字列 ⇄ API では構造化した配列
 */
use serde::{Deserialize, Serialize};

/// One recipe ingredient. The "long" representation used on detail and
/// write responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub color: String,
    pub name: String,
    pub parts: i64,
}

/// Public listing omits ingredient names (the "short" representation).
#[derive(Debug, Serialize)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: i64,
}

impl From<Ingredient> for ShortIngredient {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            color: ingredient.color,
            parts: ingredient.parts,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateDrinkRequest {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl CreateDrinkRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("title is required");
        }
        if self.recipe.is_empty() {
            return Err("recipe is required");
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateDrinkRequest {
    pub title: Option<String>,
    pub recipe: Option<Vec<Ingredient>>,
}

impl UpdateDrinkRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(title) = &self.title
            && title.trim().is_empty()
        {
            return Err("title cannot be empty");
        }
        if let Some(recipe) = &self.recipe
            && recipe.is_empty()
        {
            return Err("recipe cannot be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient() -> Ingredient {
        Ingredient {
            color: "brown".to_string(),
            name: "coffee".to_string(),
            parts: 1,
        }
    }

    #[test]
    fn create_requires_title_and_recipe() {
        let request = CreateDrinkRequest {
            title: "  ".to_string(),
            recipe: vec![ingredient()],
        };
        assert!(request.validate().is_err());

        let request = CreateDrinkRequest {
            title: "espresso".to_string(),
            recipe: vec![],
        };
        assert!(request.validate().is_err());

        let request = CreateDrinkRequest {
            title: "espresso".to_string(),
            recipe: vec![ingredient()],
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn update_rejects_empty_replacements_but_allows_omission() {
        let request = UpdateDrinkRequest {
            title: None,
            recipe: None,
        };
        assert!(request.validate().is_ok());

        let request = UpdateDrinkRequest {
            title: Some("".to_string()),
            recipe: None,
        };
        assert!(request.validate().is_err());
    }
}
