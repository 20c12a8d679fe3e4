#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::{schema::Schema, PathItemType, RefOr};
    use utoipa::OpenApi;

    fn object_properties(name: &str) -> Vec<String> {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        match components.schemas.get(name) {
            Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
            _ => panic!("{} should be an object schema", name),
        }
    }

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.components.is_some());
        let components = openapi.components.as_ref().unwrap();
        for name in [
            "ErrorResponse",
            "HealthResponse",
            "ExpenseDto",
            "BudgetStatusDto",
            "RecurringPaymentDto",
            "BatchSummaryDto",
        ] {
            assert!(components.schemas.contains_key(name), "missing schema {}", name);
        }

        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let properties = object_properties("ErrorResponse");
        for field in ["error", "code", "success"] {
            assert!(properties.iter().any(|p| p == field), "missing {}", field);
        }
    }

    #[test]
    fn test_health_response_schema_structure() {
        let properties = object_properties("HealthResponse");
        for field in ["status", "version", "store"] {
            assert!(properties.iter().any(|p| p == field), "missing {}", field);
        }
    }

    #[test]
    fn test_amounts_are_documented_as_strings() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_value(&openapi).unwrap();
        let amount = &json["components"]["schemas"]["ExpenseDto"]["properties"]["amount"];
        assert_eq!(amount["type"], "string");
    }

    #[test]
    fn test_openapi_paths() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        let expected = [
            ("/health", PathItemType::Get),
            ("/api/v1/expenses", PathItemType::Post),
            ("/api/v1/expenses", PathItemType::Get),
            ("/api/v1/expenses/{expense_id}", PathItemType::Put),
            ("/api/v1/budgets", PathItemType::Put),
            ("/api/v1/budgets/overview", PathItemType::Get),
            ("/api/v1/recurring-payments", PathItemType::Post),
            ("/api/v1/recurring-payments/{payment_id}", PathItemType::Delete),
            ("/api/v1/recurring-payments/process", PathItemType::Post),
        ];
        for (path, method) in expected {
            let item = paths.get(path).unwrap_or_else(|| panic!("missing path {}", path));
            assert!(item.operations.contains_key(&method), "missing {} {}", serde_json::to_string(&method).unwrap_or_default(), path);
        }

        let health = paths["/health"].operations.get(&PathItemType::Get).unwrap();
        assert!(health.responses.responses.contains_key("200"));
        assert!(health.responses.responses.contains_key("500"));
    }

    #[test]
    fn test_all_error_responses_reference_correct_schema() {
        let openapi = ApiDoc::openapi();
        let openapi_json = serde_json::to_string(&openapi).unwrap();

        assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
        assert!(!openapi_json.contains("crate::schemas::ErrorResponse"));
        assert!(openapi_json.contains("#/components/schemas/ErrorResponse"));
    }
}
