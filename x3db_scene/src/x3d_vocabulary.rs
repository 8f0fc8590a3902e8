//! The fixed X3D vocabulary.
//!
//! Encoder and decoder both build this table from the same ordered name lists,
//! so documents carry only indices. The element table is padded with reserved
//! placeholders to [`ELEMENT_CAPACITY`] entries and the attribute table to
//! [`ATTRIBUTE_CAPACITY`], leaving room to append names without moving any
//! existing index.

use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;

use x3db_core::{Vocabulary, VocabularyError};

/// URI current documents declare for this vocabulary.
pub const VOCABULARY_URI: &str = "urn:web3d:x3d:fi-vocabulary-3.3";

/// URI written by older encoders. Resolves to the same table.
pub const LEGACY_VOCABULARY_URI: &str = "urn:external-vocabulary";

pub const ELEMENT_CAPACITY: usize = 512;
pub const ATTRIBUTE_CAPACITY: usize = 1024;

/// Attribute value literals with a table slot.
pub const VALUE_NAMES: &[&str] = &["true", "false"];

/// Element names in index order. Frozen: new names may only be appended.
pub const ELEMENT_NAMES: &[&str] = &[
    "Shape", "Appearance", "Material", "IndexedFaceSet", "ProtoInstance", "Transform",
    "ImageTexture", "TextureTransform", "Coordinate", "Normal", "Color", "ColorRGBA",
    "TextureCoordinate", "ROUTE", "fieldValue", "Group", "LOD", "Switch", "Script",
    "IndexedTriangleSet", "IndexedLineSet", "PointSet", "Inline", "Viewpoint", "TimeSensor",
    "PositionInterpolator", "OrientationInterpolator", "TouchSensor", "Box", "Sphere",
    "Cylinder", "Cone", "Text", "FontStyle", "MetadataString", "MetadataFloat",
    "MetadataInteger", "MetadataSet", "X3D", "head", "component", "meta", "unit", "Scene",
    "IMPORT", "EXPORT", "ProtoDeclare", "ExternProtoDeclare", "ProtoInterface", "ProtoBody",
    "field", "IS", "connect", "Anchor", "Arc2D", "ArcClose2D", "AudioClip", "Background",
    "BallJoint", "Billboard", "BlendedVolumeStyle", "BooleanFilter", "BooleanSequencer",
    "BooleanToggle", "BooleanTrigger", "BoundaryEnhancementVolumeStyle", "BoundedPhysicsModel",
    "CADAssembly", "CADFace", "CADLayer", "CADPart", "CartoonVolumeStyle", "Circle2D",
    "ClipPlane", "CollidableOffset", "CollidableShape", "Collision", "CollisionCollection",
    "CollisionSensor", "CollisionSpace", "ColorChaser", "ColorDamper", "ColorInterpolator",
    "ComposedCubeMapTexture", "ComposedShader", "ComposedTexture3D", "ComposedVolumeStyle",
    "ConeEmitter", "Contact", "Contour2D", "ContourPolyline2D", "CoordinateChaser",
    "CoordinateDamper", "CoordinateDouble", "CoordinateInterpolator",
    "CoordinateInterpolator2D", "CylinderSensor", "DirectionalLight", "DISEntityManager",
    "DISEntityTypeMapping", "Disk2D", "DoubleAxisHingeJoint", "EaseInEaseOut",
    "EdgeEnhancementVolumeStyle", "ElevationGrid", "EspduTransform", "ExplosionEmitter",
    "Extrusion", "FillProperties", "FloatVertexAttribute", "Fog", "FogCoordinate",
    "ForcePhysicsModel", "GeneratedCubeMapTexture", "GeoCoordinate", "GeoElevationGrid",
    "GeoLocation", "GeoLOD", "GeoMetadata", "GeoOrigin", "GeoPositionInterpolator",
    "GeoProximitySensor", "GeoTouchSensor", "GeoTransform", "GeoViewpoint", "HAnimDisplacer",
    "HAnimHumanoid", "HAnimJoint", "HAnimSegment", "HAnimSite", "ImageCubeMapTexture",
    "ImageTexture3D", "IndexedQuadSet", "IndexedTriangleFanSet", "IndexedTriangleStripSet",
    "IntegerSequencer", "IntegerTrigger", "IsoSurfaceVolumeData", "KeySensor", "Layer",
    "LayerSet", "Layout", "LayoutGroup", "LayoutLayer", "LinePickSensor", "LineProperties",
    "LineSet", "LoadSensor", "LocalFog", "Matrix3VertexAttribute", "Matrix4VertexAttribute",
    "MetadataBoolean", "MetadataDouble", "MotorJoint", "MovieTexture", "MultiTexture",
    "MultiTextureCoordinate", "MultiTextureTransform", "NavigationInfo", "NormalInterpolator",
    "NurbsCurve", "NurbsCurve2D", "NurbsOrientationInterpolator", "NurbsPatchSurface",
    "NurbsPositionInterpolator", "NurbsSet", "NurbsSurfaceInterpolator", "NurbsSweptSurface",
    "NurbsSwungSurface", "NurbsTextureCoordinate", "NurbsTrimmedSurface",
    "OpacityMapVolumeStyle", "OrientationChaser", "OrientationDamper", "OrthoViewpoint",
    "PackagedShader", "ParticleSystem", "PickableGroup", "PixelTexture", "PixelTexture3D",
    "PlaneSensor", "PointEmitter", "PointLight", "PointPickSensor", "Polyline2D",
    "PolylineEmitter", "Polypoint2D", "PositionChaser", "PositionChaser2D", "PositionDamper",
    "PositionDamper2D", "PositionInterpolator2D", "PrimitivePickSensor", "ProgramShader",
    "ProjectionVolumeStyle", "ProximitySensor", "QuadSet", "ReceiverPdu", "Rectangle2D",
    "RigidBody", "RigidBodyCollection", "ScalarChaser", "ScalarDamper", "ScalarInterpolator",
    "ScreenFontStyle", "ScreenGroup", "SegmentedVolumeData", "ShadedVolumeStyle", "ShaderPart",
    "ShaderProgram", "SignalPdu", "SilhouetteEnhancementVolumeStyle", "SingleAxisHingeJoint",
    "SliderJoint", "Sound", "SphereSensor", "SplinePositionInterpolator",
    "SplinePositionInterpolator2D", "SplineScalarInterpolator", "SpotLight",
    "SquadOrientationInterpolator", "StaticGroup", "StringSensor", "SurfaceEmitter",
    "TexCoordChaser2D", "TexCoordDamper2D", "TextureBackground", "TextureCoordinate3D",
    "TextureCoordinate4D", "TextureCoordinateGenerator", "TextureProperties",
    "TextureTransform3D", "TextureTransformMatrix3D", "TimeTrigger", "ToneMappedVolumeStyle",
    "TransformSensor", "TransmitterPdu", "TriangleFanSet", "TriangleSet", "TriangleSet2D",
    "TriangleStripSet", "TwoSidedMaterial", "UniversalJoint", "ViewpointGroup", "Viewport",
    "VisibilitySensor", "VolumeData", "VolumeEmitter", "VolumePickSensor", "WindPhysicsModel",
    "WorldInfo",
];

/// Attribute names in index order. Frozen: new names may only be appended.
pub const ATTRIBUTE_NAMES: &[&str] = &[
    "DEF", "USE", "containerField", "class", "name", "value", "fromNode", "fromField", "toNode",
    "toField", "nodeField", "protoField", "point", "coordIndex", "normalIndex", "colorIndex",
    "texCoordIndex", "index", "vector", "color", "diffuseColor", "emissiveColor",
    "specularColor", "ambientIntensity", "shininess", "transparency", "translation", "rotation",
    "scale", "scaleOrientation", "center", "size", "radius", "height", "bottomRadius", "solid",
    "ccw", "convex", "creaseAngle", "colorPerVertex", "normalPerVertex", "url", "key",
    "keyValue", "set_fraction", "fraction_changed", "value_changed", "enabled", "loop",
    "cycleInterval", "startTime", "stopTime", "description", "bboxCenter", "bboxSize",
    "orientation", "position", "fieldOfView", "type", "accessType", "actionKeyPress",
    "actionKeyRelease", "address", "alpha", "altKey", "anchorPoint", "angle",
    "angularDampingFactor", "angularVelocity", "anisotropicDegree", "antennaLocation",
    "antennaPatternLength", "antennaPatternType", "appinfo", "applicationID", "applied",
    "appliedParameters", "articulationParameterArray",
    "articulationParameterChangeIndicatorArray", "articulationParameterCount",
    "articulationParameterDesignatorArray", "articulationParameterIdPartAttachedToArray",
    "articulationParameterTypeArray", "AS", "attenuation", "autoCalc", "autoDamp",
    "autoDisable", "autoOffset", "avatarSize", "axis", "axis1", "axis1Angle", "axis1Torque",
    "axis2", "axis2Angle", "axis2Torque", "axisOfRotation", "axisRotation",
    "backAmbientIntensity", "backDiffuseColor", "backEmissiveColor", "backShininess",
    "backSpecularColor", "backTransparency", "backUrl", "beamWidth", "beginCap", "bindTime",
    "body1AnchorPoint", "body1Axis", "body2AnchorPoint", "body2Axis", "borderColor",
    "borderWidth", "bottom", "bottomUrl", "bounce", "boundaryModeR", "boundaryModeS",
    "boundaryModeT", "boundaryOpacity", "boxSize", "category", "centerOfMass",
    "centerOfRotation", "child1Url", "child2Url", "child3Url", "child4Url", "clipBoundary",
    "closed", "closureType", "collideTime", "collisionType", "colorKey", "colorSteps",
    "component", "constantForceMix", "contactNormal", "contactSurfaceThickness", "content",
    "contourStepSize", "controlKey", "controlPoint", "conversionFactor", "coolColor",
    "copyright", "createParticles", "crossSection", "cryptoKeyID", "cryptoSystem",
    "cutOffAngle", "cycleTime", "data", "dataLength", "deadReckoning", "deletionAllowed",
    "depth", "desiredAngularVelocity1", "desiredAngularVelocity2", "detonateTime",
    "detonationLocation", "detonationRelativeLocation", "detonationResult", "dimensions", "dir",
    "direction", "directOutput", "disableAngularSpeed", "disableLinearSpeed", "disableTime",
    "diskAngle", "displacements", "documentation", "domain", "duration", "duration_changed",
    "edgeColor", "elapsedTime", "enabledAxes", "encodingScheme", "endAngle", "endCap",
    "enterTime", "entityCategory", "entityCountry", "entityDomain", "entityExtra", "entityID",
    "entityKind", "entitySpecific", "entitySubCategory", "errorCorrection",
    "eventApplicationID", "eventEntityID", "eventNumber", "eventSiteID", "exitTime", "extra",
    "family", "fanCount", "farDistance", "filled", "finalText", "finiteRotationAxis", "fired1",
    "fired2", "firedTime", "fireMissionIndex", "firingRange", "firingRate", "fixed", "fogType",
    "force", "forceID", "forceOutput", "forces", "forceTransitions", "frameCount", "frequency",
    "frictionCoefficients", "frictionDirection", "frontUrl", "fuse", "generateMipMaps",
    "geoCenter", "geoCoords", "geometryType", "geoSystem", "global", "gradientThreshold",
    "gravity", "groundAngle", "groundColor", "gustiness", "hatchColor", "hatched", "hatchStyle",
    "headlight", "hinge1Angle", "hinge1AngleRate", "hinge2Angle", "hinge2AngleRate",
    "hitGeoCoord_changed", "hitNormal_changed", "hitPoint_changed", "hitTexCoord_changed",
    "horizontal", "http-equiv", "image", "importedDEF", "inertia", "info", "initialDestination",
    "initialValue", "inlineDEF", "inputFalse", "inputNegate", "inputTrue", "integerKey",
    "intensity", "internal", "intersectionType", "isActive", "isBound", "isCollided",
    "isLoaded", "isOver", "isPaused", "isSelected", "isValid", "iterations", "jump", "justify",
    "keyVelocity", "kind", "knot", "lang", "language", "leftToRight", "leftUrl", "length",
    "lengthOfModulationParameters", "level", "lifetimeSeconds", "limitOrientation",
    "linearAcceleration", "linearVelocity", "lineSegments", "linetype", "linewidthScaleFactor",
    "llimit", "load", "loadTime", "localDEF", "location", "magnificationFilter", "marking",
    "mass", "matchCriterion", "maxAngle", "maxAngle1", "maxBack", "maxCorrectionSpeed",
    "maxExtent", "maxFront", "maxParticles", "maxPosition", "maxSeparation", "maxTorque1",
    "maxTorque2", "minAngle", "minAngle1", "minBack", "minBounceSpeed", "minFront",
    "minificationFilter", "minPosition", "minSeparation", "mode", "modifiedFraction_changed",
    "modulationTypeDetail", "modulationTypeMajor", "modulationTypeSpreadSpectrum",
    "modulationTypeSystem", "motor1Angle", "motor1AngleRate", "motor2Angle", "motor2AngleRate",
    "motor3Angle", "motor3AngleRate", "multicastRelayHost", "multicastRelayPort",
    "munitionApplicationID", "munitionEndPoint", "munitionEntityID", "munitionQuantity",
    "munitionSiteID", "munitionStartPoint", "mustEvaluate", "navType", "nearDistance",
    "networkMode", "next", "normalizeVelocity", "numComponents", "objectType", "offset",
    "offsetUnits", "on", "order", "origin", "orthogonalColor", "outputOnly", "overlap",
    "parameter", "particleLifetime", "particleSize", "pauseTime", "pitch", "pointSize", "port",
    "power", "previous", "priority", "profile", "radioEntityTypeCategory",
    "radioEntityTypeCountry", "radioEntityTypeDomain", "radioEntityTypeKind",
    "radioEntityTypeNomenclature", "radioEntityTypeNomenclatureVersion", "radioID", "range",
    "readInterval", "receivedPower", "receiverState", "reference", "relativeAntennaLocation",
    "repeatR", "repeatS", "repeatT", "resumeTime", "retainUserOffsets", "rightUrl", "rootUrl",
    "rotateYUp", "rtpHeaderExpected", "sampleRate", "samples", "scaleMode", "scheme",
    "segmentEnabled", "separateBackColor", "separation", "separationRate", "set_bind",
    "set_boolean", "set_colorIndex", "set_contacts", "set_coordIndex", "set_height",
    "set_normalIndex", "set_texCoordIndex", "set_triggerTime", "shadows", "side",
    "silhouetteBoundaryOpacity", "silhouetteRetainedOpacity", "silhouetteSharpness", "siteID",
    "skin", "skinCoordIndex", "skinCoordWeight", "sliderForce", "slipCoefficients",
    "slipFactors", "softnessConstantForceMix", "softnessErrorCorrection", "sortOrder", "source",
    "spacing", "spatialize", "speed", "speedFactor", "spine", "stiffness", "stop1Bounce",
    "stop1ConstantForceMix", "stop1ErrorCorrection", "stop2Bounce", "stop2ErrorCorrection",
    "stop3Bounce", "stop3ErrorCorrection", "stopBounce", "stopErrorCorrection", "string",
    "stripCount", "style", "subcategory", "summary", "surfaceArea", "surfaceSpeed",
    "surfaceValues", "suspensionErrorCorrection", "suspensionForce", "tau", "tdlType", "time",
    "timeOut", "title", "topToBottom", "topUrl", "torques", "trackPoint_changed",
    "transitionComplete", "transitionTime", "transitionType", "transmitFrequencyBandwidth",
    "transmitState", "transmitterApplicationID", "transmitterEntityID", "transmitterRadioID",
    "transmitterSiteID", "triggerTime", "triggerTrue", "triggerValue", "turbulence", "uClosed",
    "uDimension", "uKnot", "ulimit", "uOrder", "upVector", "useFiniteRotation", "useGeometry",
    "useGlobalGravity", "uTessellation", "vClosed", "vDimension", "version", "vertexCount",
    "vertices", "viewAll", "visibilityLimit", "visibilityRange", "vKnot", "vOrder",
    "vTessellation", "warhead", "warmColor", "watchList", "weight", "weightConstant1",
    "weightConstant2", "weightFunction1", "weightFunction2", "whichChoice", "whichGeometry",
    "writeInterval", "xDimension", "xmlns:xsd", "xsd:noNamespaceSchemaLocation", "xSpacing",
    "yScale", "zDimension", "zSpacing",
    // appended; earlier indices unchanged
    "skyColor", "skyAngle", "skyTransparency", "groundTransparency", "geoGridOrigin",
    "momentsOfInertia", "textureCompression", "texturePriority", "tessellation",
    "tessellationScale", "shiftKey", "innerRadius", "outerRadius", "startAngle", "top", "function",
    "matrix", "plane", "isPickable", "activeLayer", "align", "sizeUnits", "linearDampingFactor",
    "preferAccuracy", "lightFactor", "opacityFactor", "surfaceTolerance", "intensityThreshold",
    "lighting", "phaseFunction", "parallelColor", "variation", "lifetimeVariation", "tolerance",
    "update",
];
static SHARED: Lazy<Result<Arc<Vocabulary>, VocabularyError>> = Lazy::new(|| build().map(Arc::new));

/// Run the bootstrap sequence and return a fresh table.
pub fn build() -> Result<Vocabulary, VocabularyError> {
    let mut vocabulary = Vocabulary::new();
    for name in ELEMENT_NAMES {
        vocabulary.add_element(name)?;
    }
    vocabulary.reserve_element(ELEMENT_CAPACITY)?;
    for name in ATTRIBUTE_NAMES {
        vocabulary.add_attribute(name)?;
    }
    vocabulary.reserve_attribute(ATTRIBUTE_CAPACITY)?;
    for name in VALUE_NAMES {
        vocabulary.add_value(name)?;
    }
    debug!(
        elements = ELEMENT_NAMES.len(),
        attributes = ATTRIBUTE_NAMES.len(),
        "X3D vocabulary built"
    );
    Ok(vocabulary)
}

/// Process-wide instance, built on first use.
pub fn shared() -> Result<Arc<Vocabulary>, VocabularyError> {
    SHARED.clone()
}
