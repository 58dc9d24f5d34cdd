// Data model: the raw user shape returned by the device and the normalized
// record that ends up in the snapshot. The device omits fields freely, so the
// raw struct defaults everything except the employee number; normalization
// then produces one fixed schema for every user in the output.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One enrolled user as returned by the UserInfo search endpoint. Opaque
/// blocks (`Valid`, `RightPlan` entries, `PersonInfoExtends`) are kept as
/// `serde_json::Value` because their exact shape varies between firmware
/// versions and we pass them through unmodified.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceUser {
    #[serde(rename = "employeeNo")]
    pub employee_no: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "userType", default)]
    pub user_type: String,
    #[serde(rename = "Valid", default)]
    pub valid: Value,
    #[serde(rename = "belongGroup", default)]
    pub belong_group: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "doorRight", default)]
    pub door_right: String,
    #[serde(rename = "RightPlan", default)]
    pub right_plan: Vec<Value>,
    #[serde(default)]
    pub gender: String,
    #[serde(rename = "numOfCard", default)]
    pub num_of_card: u32,
    #[serde(rename = "numOfFP", default)]
    pub num_of_fp: u32,
    #[serde(rename = "numOfFace", default)]
    pub num_of_face: u32,
    #[serde(rename = "groupId", default)]
    pub group_id: i64,
    #[serde(rename = "localAtndPlanTemplateId", default)]
    pub local_atnd_plan_template_id: i64,
    #[serde(rename = "PersonInfoExtends", default)]
    pub person_info_extends: Vec<Value>,
}

/// A fully enriched, normalized user record as written to the snapshot.
/// Every field is always present: strings default to empty, counts to zero,
/// lists to empty, and the two enrichment fields to null. Field names match
/// the device's own JSON so the snapshot stays diffable against raw dumps.
///
/// `local_image_path` is non-null only when `face_url` was non-null at
/// enrichment time and the download completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedUser {
    #[serde(rename = "employeeNo")]
    pub employee_no: String,
    pub name: String,
    #[serde(rename = "userType")]
    pub user_type: String,
    #[serde(rename = "Valid")]
    pub valid: Value,
    #[serde(rename = "belongGroup")]
    pub belong_group: String,
    pub password: String,
    #[serde(rename = "doorRight")]
    pub door_right: String,
    #[serde(rename = "RightPlan")]
    pub right_plan: Vec<Value>,
    pub gender: String,
    #[serde(rename = "numOfCard")]
    pub num_of_card: u32,
    #[serde(rename = "numOfFP")]
    pub num_of_fp: u32,
    #[serde(rename = "numOfFace")]
    pub num_of_face: u32,
    #[serde(rename = "groupId")]
    pub group_id: i64,
    #[serde(rename = "localAtndPlanTemplateId")]
    pub local_atnd_plan_template_id: i64,
    #[serde(rename = "PersonInfoExtends")]
    pub person_info_extends: Vec<Value>,
    #[serde(rename = "faceURL")]
    pub face_url: Option<String>,
    /// Relative filename inside the run directory, e.g. `"1001.jpg"`.
    pub local_image_path: Option<String>,
    /// Card records exactly as the device returned them.
    pub cards: Vec<Value>,
}

impl ExportedUser {
    /// Merge a raw user with its enrichment results into the fixed output
    /// shape. Defaults for fields the device omitted were already filled in
    /// when `DeviceUser` was deserialized.
    pub fn from_parts(
        user: DeviceUser,
        face_url: Option<String>,
        local_image_path: Option<String>,
        cards: Vec<Value>,
    ) -> Self {
        ExportedUser {
            employee_no: user.employee_no,
            name: user.name,
            user_type: user.user_type,
            valid: user.valid,
            belong_group: user.belong_group,
            password: user.password,
            door_right: user.door_right,
            right_plan: user.right_plan,
            gender: user.gender,
            num_of_card: user.num_of_card,
            num_of_fp: user.num_of_fp,
            num_of_face: user.num_of_face,
            group_id: user.group_id,
            local_atnd_plan_template_id: user.local_atnd_plan_template_id,
            person_info_extends: user.person_info_extends,
            face_url,
            local_image_path,
            cards,
        }
    }
}
