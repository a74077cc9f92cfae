//! Backend DTO → model mappers.
//!
//! The backend speaks Spanish field names and is inconsistent about types
//! (numeric vs string ids, nested vs flat references). Every mapper here is
//! total: a missing or mistyped field degrades to the model's default and
//! never produces an error.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

use crate::models::{
    Authorization, Course, Ingredient, PendingListEntry, Recipe, Role, Schedule, Site, Step,
    Student, User, UserRef, UNKNOWN_DURATION,
};

/// Map a backend recipe record.
pub fn map_recipe(raw: &Value) -> Recipe {
    Recipe {
        id: id_text(raw, &["idReceta", "id"]),
        title: text(raw, &["nombreReceta", "nombre", "titulo", "title"]),
        description: text(raw, &["descripcionReceta", "descripcion", "description"]),
        image: opt_text(raw, &["fotoPrincipal", "imagen", "foto", "image"]),
        servings: count(raw, &["porciones", "servings"]),
        people: count(raw, &["cantidadPersonas", "people"]),
        created_at: opt_text(raw, &["fecha", "fechaCreacion", "createdAt"]),
        duration: duration(raw, &["duracion", "tiempo", "duration"], "min"),
        ingredients: list(raw, &["ingredientes", "utilizados", "ingredients"])
            .iter()
            .map(map_ingredient)
            .collect(),
        steps: list(raw, &["pasos", "steps"])
            .iter()
            .enumerate()
            .map(|(index, step)| map_step(step, index))
            .collect(),
        user: map_user_ref(raw),
        category: labelled(raw, &["tipoReceta", "categoria", "category"]),
        rating: number(raw, &["calificacion", "promedioCalificacion", "rating"]),
        review_count: count(
            raw,
            &["cantidadResenas", "cantidadCalificaciones", "reviewCount"],
        ),
        authorization: map_authorization(raw),
    }
}

/// Map an entry of the per-user pending list. Entries either wrap the recipe
/// under `receta` or are the recipe record itself.
pub fn map_pending_entry(raw: &Value) -> PendingListEntry {
    let recipe = raw
        .get("receta")
        .filter(|nested| nested.is_object())
        .map_or_else(|| map_recipe(raw), map_recipe);

    PendingListEntry {
        recipe,
        completed: flag(raw, &["completada", "completed"]).unwrap_or(false),
        completed_date: date(raw, &["fechaCompletada", "completedDate"]),
        added_date: date(raw, &["fechaAgregada", "addedDate"]),
    }
}

/// Map a backend course record.
pub fn map_course(raw: &Value) -> Course {
    let id = id_text(raw, &["idCurso", "id"]);
    let schedules = list(raw, &["cronogramas", "cronograma", "schedules"])
        .iter()
        .map(|schedule| {
            let mut schedule = map_schedule(schedule);
            if schedule.course_id.is_empty() {
                schedule.course_id.clone_from(&id);
            }
            schedule
        })
        .collect();

    Course {
        title: text(raw, &["nombreCurso", "nombre", "titulo", "title"]),
        description: text(raw, &["descripcion", "description"]),
        image: opt_text(raw, &["imagen", "foto", "image"]),
        duration: duration(raw, &["duracion", "duration"], "h"),
        price: field(raw, &["precio", "price"]).and_then(as_f64),
        modality: text(raw, &["modalidad", "modality"]),
        requirements: text(raw, &["requerimientos", "requisitos", "requirements"]),
        contents: text_list(raw, &["contenidos", "temario", "contents"]),
        sites: list(raw, &["sedes", "sites"]).iter().map(map_site).collect(),
        schedules,
        id,
    }
}

/// Map a backend site (sede) record.
pub fn map_site(raw: &Value) -> Site {
    Site {
        id: id_text(raw, &["idSede", "id"]),
        name: text(raw, &["nombreSede", "nombre", "name"]),
        address: text(raw, &["direccionSede", "direccion", "address"]),
        phone: text(raw, &["telefonoSede", "telefono", "phone"]),
        email: text(raw, &["mailSede", "mail", "email"]),
    }
}

/// Map a backend schedule (cronograma) record.
pub fn map_schedule(raw: &Value) -> Schedule {
    Schedule {
        id: id_text(raw, &["idCronograma", "id"]),
        course_id: nested_id(raw, &["idCurso", "courseId"], "curso", &["idCurso", "id"]),
        site_id: nested_id(raw, &["idSede", "siteId"], "sede", &["idSede", "id"]),
        start_date: opt_text(raw, &["fechaInicio", "startDate"]),
        end_date: opt_text(raw, &["fechaFin", "endDate"]),
        available_slots: count(
            raw,
            &["vacantesDisponibles", "vacantes", "availableSlots"],
        ),
    }
}

/// Map a backend user record.
pub fn map_user(raw: &Value) -> User {
    User {
        id: id_text(raw, &["idUsuario", "id"]),
        username: text(raw, &["nickname", "alias", "username"]),
        email: text(raw, &["mail", "email"]),
        name: text(raw, &["nombre", "name"]),
        avatar: opt_text(raw, &["avatar", "foto"]),
        role: opt_text(raw, &["tipoUsuario", "rol", "role"])
            .map_or(Role::User, |label| Role::from_label(&label)),
    }
}

/// Map a backend student (alumno) record.
pub fn map_student(raw: &Value) -> Student {
    let mut user = raw
        .get("usuario")
        .filter(|nested| nested.is_object())
        .map_or_else(|| map_user(raw), map_user);
    user.role = Role::Student;

    Student {
        user,
        card_number: opt_text(raw, &["numeroTarjeta", "nroTarjeta", "cardNumber"]),
        balance: number(raw, &["cuentaCorriente", "saldo", "balance"]),
        enrolled_courses: list(raw, &["cursosInscriptos", "cursos", "enrolledCourses"])
            .iter()
            .filter_map(|course| {
                scalar_text(course).or_else(|| normalize(id_text(course, &["idCurso", "id"])))
            })
            .collect(),
    }
}

fn map_ingredient(raw: &Value) -> Ingredient {
    if let Some(name) = raw.as_str() {
        return Ingredient {
            name: name.trim().to_string(),
            amount: String::new(),
        };
    }

    let name = opt_text(raw, &["nombre", "name"])
        .or_else(|| raw.get("ingrediente").map(labelled_value))
        .unwrap_or_default();

    let amount = opt_text(raw, &["cantidadFormateada", "amount"]).unwrap_or_else(|| {
        let quantity = field(raw, &["cantidad", "quantity"]).and_then(as_f64);
        let unit = field(raw, &["unidad", "unit"])
            .map(labelled_value)
            .unwrap_or_default();
        format_amount(quantity, &unit)
    });

    Ingredient { name, amount }
}

fn map_step(raw: &Value, index: usize) -> Step {
    let fallback_number = u32::try_from(index + 1).unwrap_or(u32::MAX);
    let number = field(raw, &["nroPaso", "numero", "number"])
        .and_then(as_f64)
        .and_then(to_u32)
        .unwrap_or(fallback_number);

    Step {
        number,
        text: text(raw, &["texto", "descripcion", "text"]),
        image: opt_text(raw, &["imagen", "foto", "image"]).or_else(|| {
            list(raw, &["multimedia"])
                .first()
                .and_then(|media| opt_text(media, &["urlContenido", "url"]))
        }),
    }
}

fn map_user_ref(raw: &Value) -> Option<UserRef> {
    if let Some(nested) = field(raw, &["usuario", "user"]).filter(|value| value.is_object()) {
        let id = id_text(nested, &["idUsuario", "id"]);
        if id.is_empty() {
            return None;
        }
        return Some(UserRef {
            id,
            name: text(nested, &["nickname", "alias", "nombre", "name"]),
        });
    }

    let id = id_text(raw, &["idUsuario", "userId"]);
    if id.is_empty() {
        None
    } else {
        Some(UserRef {
            id,
            name: text(raw, &["nombreUsuario", "nickname", "userName"]),
        })
    }
}

fn map_authorization(raw: &Value) -> Authorization {
    if let Some(authorized) = flag(raw, &["autorizada", "authorized"]) {
        return if authorized {
            Authorization::Published
        } else {
            Authorization::Pending
        };
    }

    match opt_text(raw, &["estado", "status"])
        .map(|status| status.to_ascii_lowercase())
        .as_deref()
    {
        Some("aprobada" | "publicada" | "published" | "approved") => Authorization::Published,
        _ => Authorization::Pending,
    }
}

fn format_amount(quantity: Option<f64>, unit: &str) -> String {
    match (quantity, unit.trim()) {
        (Some(quantity), "") => format!("{quantity}"),
        (Some(quantity), unit) => format!("{quantity} {unit}"),
        (None, unit) => unit.to_string(),
    }
}

/// Build the backend body for creating or updating a recipe.
///
/// Only author-editable fields are sent; ids, ratings and authorization are
/// owned by the backend.
pub fn recipe_payload(recipe: &Recipe) -> Value {
    let mut payload = json!({
        "nombreReceta": recipe.title,
        "descripcionReceta": recipe.description,
        "porciones": recipe.servings,
        "cantidadPersonas": recipe.people,
        "tipoReceta": recipe.category,
        "ingredientes": recipe
            .ingredients
            .iter()
            .map(|ingredient| json!({ "nombre": ingredient.name, "cantidadFormateada": ingredient.amount }))
            .collect::<Vec<_>>(),
        "pasos": recipe
            .steps
            .iter()
            .map(|step| json!({ "nroPaso": step.number, "texto": step.text, "imagen": step.image }))
            .collect::<Vec<_>>(),
    });

    if let Value::Object(fields) = &mut payload {
        if let Some(image) = &recipe.image {
            fields.insert("fotoPrincipal".to_string(), json!(image));
        }
        if recipe.duration != UNKNOWN_DURATION {
            fields.insert("duracion".to_string(), json!(recipe.duration));
        }
        if let Some(user) = &recipe.user {
            fields.insert("idUsuario".to_string(), json!(user.id));
        }
    }
    payload
}

// ---------------------------------------------------------------------------
// Field access helpers
// ---------------------------------------------------------------------------

fn field<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| !value.is_null())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => normalize(text.trim().to_string()),
        Value::Number(number) => Some(
            number
                .as_i64()
                .map(|value| value.to_string())
                .or_else(|| number.as_u64().map(|value| value.to_string()))
                .unwrap_or_else(|| number.to_string()),
        ),
        Value::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}

fn normalize(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn opt_text(raw: &Value, keys: &[&str]) -> Option<String> {
    field(raw, keys).and_then(scalar_text)
}

fn text(raw: &Value, keys: &[&str]) -> String {
    opt_text(raw, keys).unwrap_or_default()
}

fn id_text(raw: &Value, keys: &[&str]) -> String {
    text(raw, keys)
}

/// Id found either flat on the record or inside a nested reference object.
fn nested_id(raw: &Value, flat_keys: &[&str], nested_key: &str, nested_keys: &[&str]) -> String {
    opt_text(raw, flat_keys)
        .or_else(|| raw.get(nested_key).and_then(|nested| opt_text(nested, nested_keys)))
        .unwrap_or_default()
}

/// Text that may be given directly or as `{ "descripcion": ... }`.
fn labelled(raw: &Value, keys: &[&str]) -> String {
    field(raw, keys).map(labelled_value).unwrap_or_default()
}

fn labelled_value(value: &Value) -> String {
    scalar_text(value)
        .or_else(|| opt_text(value, &["descripcion", "nombre", "name"]))
        .unwrap_or_default()
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range-checked
fn to_u32(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) {
        Some(value.trunc() as u32)
    } else {
        None
    }
}

fn number(raw: &Value, keys: &[&str]) -> f64 {
    field(raw, keys).and_then(as_f64).unwrap_or(0.0)
}

fn count(raw: &Value, keys: &[&str]) -> u32 {
    field(raw, keys).and_then(as_f64).and_then(to_u32).unwrap_or(0)
}

fn flag(raw: &Value, keys: &[&str]) -> Option<bool> {
    match field(raw, keys)? {
        Value::Bool(value) => Some(*value),
        Value::Number(number) => number.as_i64().map(|value| value != 0),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "si" | "sí" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn list<'a>(raw: &'a Value, keys: &[&str]) -> &'a [Value] {
    field(raw, keys)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn text_list(raw: &Value, keys: &[&str]) -> Vec<String> {
    match field(raw, keys) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(Value::String(text)) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn duration(raw: &Value, keys: &[&str], unit: &str) -> String {
    match field(raw, keys) {
        Some(Value::Number(number)) => format!("{number} {unit}"),
        Some(value) => scalar_text(value).unwrap_or_else(|| UNKNOWN_DURATION.to_string()),
        None => UNKNOWN_DURATION.to_string(),
    }
}

fn date(raw: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    match field(raw, keys)? {
        Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|date| date.with_timezone(&Utc)),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn recipe_payload_maps_back_through_map_recipe() {
        let recipe = Recipe {
            id: "ignored".to_string(),
            title: "Guiso".to_string(),
            description: "De lentejas".to_string(),
            servings: 4,
            duration: "45 min".to_string(),
            category: "Platos".to_string(),
            ingredients: vec![Ingredient {
                name: "Lentejas".to_string(),
                amount: "300 g".to_string(),
            }],
            steps: vec![Step {
                number: 1,
                text: "Remojar".to_string(),
                image: None,
            }],
            authorization: Authorization::Published,
            ..Recipe::default()
        };

        let payload = recipe_payload(&recipe);
        assert!(payload.get("idReceta").is_none());
        assert!(payload.get("autorizada").is_none());

        let mapped = map_recipe(&payload);
        assert_eq!(mapped.title, recipe.title);
        assert_eq!(mapped.duration, "45 min");
        assert_eq!(mapped.ingredients, recipe.ingredients);
        assert_eq!(mapped.steps, recipe.steps);
        assert_eq!(mapped.category, "Platos");
        assert_eq!(mapped.authorization, Authorization::Pending);
    }

    #[test]
    fn map_recipe_translates_backend_fields() {
        let raw = json!({
            "idReceta": 5,
            "nombreReceta": "Tarta",
            "descripcionReceta": "De manzana",
            "fotoPrincipal": "https://img/tarta.jpg",
            "porciones": 8,
            "cantidadPersonas": 4,
            "tipoReceta": { "descripcion": "Postres" },
            "usuario": { "idUsuario": 3, "nickname": "ana" },
            "utilizados": [
                { "ingrediente": { "nombre": "Harina" }, "cantidad": 200, "unidad": { "descripcion": "g" } },
                { "nombre": "Huevos", "cantidad": "2" },
                "Sal"
            ],
            "pasos": [
                { "nroPaso": 1, "texto": "Mezclar" },
                { "texto": "Hornear", "multimedia": [{ "urlContenido": "https://img/paso.jpg" }] }
            ],
            "calificacion": 4.5,
            "cantidadResenas": 12,
            "autorizada": true
        });

        let recipe = map_recipe(&raw);
        assert_eq!(recipe.id, "5");
        assert_eq!(recipe.title, "Tarta");
        assert_eq!(recipe.description, "De manzana");
        assert_eq!(recipe.image.as_deref(), Some("https://img/tarta.jpg"));
        assert_eq!(recipe.servings, 8);
        assert_eq!(recipe.people, 4);
        assert_eq!(recipe.category, "Postres");
        assert_eq!(
            recipe.user,
            Some(UserRef {
                id: "3".to_string(),
                name: "ana".to_string()
            })
        );
        assert_eq!(
            recipe.ingredients,
            vec![
                Ingredient {
                    name: "Harina".to_string(),
                    amount: "200 g".to_string()
                },
                Ingredient {
                    name: "Huevos".to_string(),
                    amount: "2".to_string()
                },
                Ingredient {
                    name: "Sal".to_string(),
                    amount: String::new()
                },
            ]
        );
        assert_eq!(recipe.steps[0].number, 1);
        assert_eq!(recipe.steps[1].number, 2);
        assert_eq!(recipe.steps[1].image.as_deref(), Some("https://img/paso.jpg"));
        assert!((recipe.rating - 4.5).abs() < f64::EPSILON);
        assert_eq!(recipe.review_count, 12);
        assert_eq!(recipe.authorization, Authorization::Published);
    }

    #[test]
    fn map_recipe_defaults_missing_fields() {
        let recipe = map_recipe(&json!({ "id": "9" }));
        assert_eq!(recipe.id, "9");
        assert_eq!(recipe.title, "");
        assert_eq!(recipe.duration, UNKNOWN_DURATION);
        assert!(recipe.ingredients.is_empty());
        assert!(recipe.steps.is_empty());
        assert!(recipe.user.is_none());
        assert_eq!(recipe.authorization, Authorization::Pending);
    }

    #[test]
    fn map_recipe_tolerates_non_object_input() {
        let recipe = map_recipe(&Value::Null);
        assert_eq!(recipe, Recipe::default());
    }

    #[test]
    fn map_recipe_reads_status_label() {
        let recipe = map_recipe(&json!({ "id": 1, "estado": "Aprobada" }));
        assert_eq!(recipe.authorization, Authorization::Published);
    }

    #[test]
    fn map_pending_entry_unwraps_nested_recipe() {
        let raw = json!({
            "receta": { "idReceta": 5, "nombreReceta": "Tarta" },
            "completada": "si",
            "fechaAgregada": "2024-05-01T10:00:00Z"
        });

        let entry = map_pending_entry(&raw);
        assert_eq!(entry.recipe.id, "5");
        assert_eq!(entry.recipe.title, "Tarta");
        assert!(entry.completed);
        assert_eq!(
            entry.added_date.map(|date| date.to_rfc3339()),
            Some("2024-05-01T10:00:00+00:00".to_string())
        );
    }

    #[test]
    fn map_course_links_schedules_and_sites() {
        let raw = json!({
            "idCurso": 10,
            "descripcion": "Pastelería básica",
            "nombreCurso": "Pastelería",
            "duracion": 12,
            "precio": "1500,50",
            "modalidad": "presencial",
            "contenidos": "Masas\nCremas\n",
            "sedes": [{ "idSede": 2, "nombreSede": "Centro", "direccionSede": "Av. 1" }],
            "cronogramas": [{ "idCronograma": 7, "sede": { "idSede": 2 }, "vacantesDisponibles": 15 }]
        });

        let course = map_course(&raw);
        assert_eq!(course.id, "10");
        assert_eq!(course.title, "Pastelería");
        assert_eq!(course.duration, "12 h");
        assert_eq!(course.price, Some(1500.5));
        assert_eq!(course.contents, vec!["Masas", "Cremas"]);
        assert_eq!(course.sites[0].name, "Centro");
        assert_eq!(course.schedules[0].course_id, "10");
        assert_eq!(course.schedules[0].site_id, "2");
        assert_eq!(course.schedules[0].available_slots, 15);
    }

    #[test]
    fn map_course_defaults_duration_sentinel() {
        let course = map_course(&json!({ "idCurso": 1 }));
        assert_eq!(course.duration, UNKNOWN_DURATION);
        assert!(course.price.is_none());
        assert!(course.schedules.is_empty());
    }

    #[test]
    fn map_user_and_student() {
        let user = map_user(&json!({
            "idUsuario": 4,
            "nickname": "chef",
            "mail": "chef@example.com",
            "tipoUsuario": "Administrador"
        }));
        assert_eq!(user.id, "4");
        assert_eq!(user.username, "chef");
        assert_eq!(user.role, Role::Admin);

        let student = map_student(&json!({
            "usuario": { "idUsuario": 4, "nickname": "chef" },
            "nroTarjeta": "4111",
            "cuentaCorriente": 250.0,
            "cursosInscriptos": [10, { "idCurso": 11 }]
        }));
        assert_eq!(student.user.id, "4");
        assert_eq!(student.user.role, Role::Student);
        assert_eq!(student.card_number.as_deref(), Some("4111"));
        assert_eq!(student.enrolled_courses, vec!["10", "11"]);
    }
}
