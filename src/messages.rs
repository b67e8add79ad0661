//! User-facing message texts.

pub const WELCOME: &str = "Добро пожаловать в 3D просмотрщик панорам! Загрузите свои панорамные изображения для создания виртуального тура.";
pub const DRAG_DROP: &str =
    "Перетащите панорамные изображения сюда или нажмите для выбора файлов";
pub const VALIDATION_ERROR: &str =
    "Файл должен быть изображением в формате JPEG, PNG или WebP с пропорциями примерно 2:1";
pub const LOADING_ERROR: &str = "Ошибка загрузки изображения. Пожалуйста, попробуйте другой файл.";
pub const ASPECT_WARNING: &str = "Изображение должно иметь пропорции примерно 2:1 для панорамы";
pub const DELETED: &str = "Панорама удалена";
pub const PRESET_PROTECTED: &str = "Демо-панорамы нельзя удалить";
pub const CONTEXT_LOST: &str = "Контекст отрисовки потерян, панорама будет перезагружена";
pub const INTERACTION_HINT: &str =
    "Перетаскивайте для осмотра, колесо мыши или щипок для масштаба, стрелки для поворота";

/// Size rejection, naming the limit in megabytes.
pub fn file_too_large(limit_bytes: u64) -> String {
    format!(
        "Файл слишком большой. Максимальный размер: {}MB",
        limit_bytes / 1024 / 1024
    )
}

/// Upload success.
pub fn loaded(name: &str) -> String {
    format!("Панорама \"{}\" загружена успешно", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_too_large_names_limit() {
        assert_eq!(
            file_too_large(52_428_800),
            "Файл слишком большой. Максимальный размер: 50MB"
        );
    }

    #[test]
    fn test_loaded_quotes_name() {
        assert_eq!(loaded("hall.jpg"), "Панорама \"hall.jpg\" загружена успешно");
    }
}
